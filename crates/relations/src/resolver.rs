use crate::{
    batch::{PolymorphicBatch, PolymorphicKey, RelationBatch},
    error::RelationError,
    loader::{DataLoader, LoaderConfig},
    path::{RelationTree, split_path},
};
use connectors::SqlExecutor;
use futures::{
    FutureExt,
    future::{BoxFuture, join_all},
};
use model::{
    core::value::Value,
    records::record::Record,
    schema::{
        relation::{PolymorphicDef, RelationDef, RelationKind},
        table::Schema,
    },
};
use planner::QueryTransformer;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Longest accepted relation path, counted in segments.
    pub max_depth: usize,
    pub loader: LoaderConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            loader: LoaderConfig::default(),
        }
    }
}

/// How a loaded relation value was laid out before its nested relations
/// were resolved.
enum Slot {
    One,
    Many(usize),
    Empty(Value),
}

/// Attaches declared relations to records.
///
/// Create one per request or page: loaders and their caches live as long as
/// the resolver (or until [`RelationshipResolver::clear`]).
pub struct RelationshipResolver {
    executor: Arc<dyn SqlExecutor>,
    schema: Arc<Schema>,
    transformer: QueryTransformer,
    config: ResolverConfig,
    loaders: Mutex<HashMap<String, Arc<DataLoader<RelationBatch>>>>,
    polymorphic_loaders: Mutex<HashMap<String, Arc<DataLoader<PolymorphicBatch>>>>,
}

impl RelationshipResolver {
    pub fn new(executor: Arc<dyn SqlExecutor>, schema: Arc<Schema>, config: ResolverConfig) -> Self {
        let transformer = QueryTransformer::new(executor.kind().dialect());
        Self {
            executor,
            schema,
            transformer,
            config,
            loaders: Mutex::new(HashMap::new()),
            polymorphic_loaders: Mutex::new(HashMap::new()),
        }
    }

    /// Loads every relation path (e.g. `author`, `comments.author.profile`)
    /// onto `records` of `table`.
    ///
    /// Unknown relations and over-deep paths fail before any query runs. A
    /// lookup that fails for some records leaves `null` (to-one) or `[]`
    /// (to-many) on those records and logs a warning.
    pub async fn load_relationships<P: AsRef<str>>(
        &self,
        table: &str,
        mut records: Vec<Record>,
        paths: &[P],
    ) -> Result<Vec<Record>, RelationError> {
        let tree = self.plan(table, paths)?;
        if tree.is_empty() || records.is_empty() {
            return Ok(records);
        }

        debug!(
            table,
            records = records.len(),
            depth = tree.depth(),
            "Loading relationships"
        );
        self.load_level(table, &mut records, &tree).await;
        Ok(records)
    }

    /// Drops every loader and its cache.
    pub async fn clear(&self) {
        self.loaders.lock().await.clear();
        self.polymorphic_loaders.lock().await.clear();
    }

    /// Checks every path against the schema and merges them into a tree.
    pub fn plan<P: AsRef<str>>(&self, table: &str, paths: &[P]) -> Result<RelationTree, RelationError> {
        let mut tree = RelationTree::new();

        for path in paths {
            let path = path.as_ref();
            let segments = split_path(path)?;
            if segments.len() > self.config.max_depth {
                return Err(RelationError::RelationDepthExceeded {
                    path: path.to_string(),
                    requested: segments.len(),
                    max: self.config.max_depth,
                });
            }

            let mut current = table.to_string();
            for (i, segment) in segments.iter().enumerate() {
                let relation = self.relation(&current, segment)?;
                if let Some(missing) = relation
                    .kind
                    .referenced_tables()
                    .into_iter()
                    .find(|t| self.schema.table(t).is_none())
                {
                    return Err(RelationError::UnknownTable(missing.to_string()));
                }
                let is_last = i + 1 == segments.len();
                match relation.kind.target_table() {
                    Some(target) => current = target.to_string(),
                    None if is_last => {}
                    None => {
                        return Err(RelationError::NestedPolymorphic {
                            path: path.to_string(),
                            relation: relation.name.clone(),
                        });
                    }
                }
            }
            tree.insert(&segments);
        }

        Ok(tree)
    }

    fn relation(&self, table: &str, name: &str) -> Result<&RelationDef, RelationError> {
        self.schema
            .table(table)
            .ok_or_else(|| RelationError::UnknownTable(table.to_string()))?
            .find_relation(name)
            .ok_or_else(|| RelationError::RelationNotFound {
                table: table.to_string(),
                relation: name.to_string(),
            })
    }

    fn load_level<'a>(
        &'a self,
        table: &'a str,
        records: &'a mut [Record],
        tree: &'a RelationTree,
    ) -> BoxFuture<'a, ()> {
        async move {
            for (name, children) in tree.children() {
                // Paths were checked by `plan`.
                let Ok(relation) = self.relation(table, name) else {
                    continue;
                };

                let mut values = self.resolve(table, relation, records).await;
                if let Some(target) = relation.kind.target_table() {
                    if !children.is_empty() {
                        self.load_nested(target, &mut values, children).await;
                    }
                }

                for (record, value) in records.iter_mut().zip(values) {
                    record.insert(name.clone(), value);
                }
            }
        }
        .boxed()
    }

    /// Resolves `tree` on the related rows held in `values`, then puts them
    /// back in place.
    async fn load_nested(&self, table: &str, values: &mut [Value], tree: &RelationTree) {
        let mut rows = Vec::new();
        let mut slots = Vec::with_capacity(values.len());

        for value in values.iter_mut() {
            match std::mem::replace(value, Value::Null) {
                Value::Record(record) => {
                    rows.push(record);
                    slots.push(Slot::One);
                }
                Value::List(items) => {
                    let before = rows.len();
                    rows.extend(items.into_iter().filter_map(|item| match item {
                        Value::Record(record) => Some(record),
                        _ => None,
                    }));
                    slots.push(Slot::Many(rows.len() - before));
                }
                other => slots.push(Slot::Empty(other)),
            }
        }

        self.load_level(table, &mut rows, tree).await;

        let mut rows = rows.into_iter();
        for (value, slot) in values.iter_mut().zip(slots) {
            *value = match slot {
                Slot::One => rows.next().map(Value::Record).unwrap_or(Value::Null),
                Slot::Many(n) => Value::List(rows.by_ref().take(n).map(Value::Record).collect()),
                Slot::Empty(value) => value,
            };
        }
    }

    /// One value per record, in record order.
    async fn resolve(&self, table: &str, relation: &RelationDef, records: &[Record]) -> Vec<Value> {
        let (owner_key, def) = match &relation.kind {
            RelationKind::HasOne { local_key, .. }
            | RelationKind::HasMany { local_key, .. }
            | RelationKind::BelongsToMany { local_key, .. } => (local_key.as_str(), None),
            RelationKind::BelongsTo { foreign_key, .. } => (foreign_key.as_str(), None),
            RelationKind::Polymorphic(def) => (def.id_field.as_str(), Some(def)),
        };

        if let Some(def) = def {
            return self.resolve_polymorphic(table, relation, def, records).await;
        }

        let to_many = relation.kind.is_to_many();
        let empty = || {
            if to_many {
                Value::List(Vec::new())
            } else {
                Value::Null
            }
        };

        let loader = self.relation_loader(table, relation).await;
        let loads = records.iter().map(|record| {
            let key = record.get_value(owner_key).key();
            let loader = Arc::clone(&loader);
            async move {
                if key.is_null() {
                    return empty();
                }
                match loader.load(key.clone()).await {
                    Ok(rows) if to_many => Value::List(rows.into_iter().map(Value::Record).collect()),
                    Ok(rows) => rows.into_iter().next().map(Value::Record).unwrap_or(Value::Null),
                    Err(err) => {
                        warn!(
                            table,
                            relation = %relation.name,
                            key = %key,
                            error = %err,
                            "Failed to load relation, using empty value"
                        );
                        empty()
                    }
                }
            }
        });

        join_all(loads).await
    }

    async fn resolve_polymorphic(
        &self,
        table: &str,
        relation: &RelationDef,
        def: &PolymorphicDef,
        records: &[Record],
    ) -> Vec<Value> {
        let loader = self.polymorphic_loader(table, relation, def).await;
        let loads = records.iter().map(|record| {
            let kind = record.get_value(&def.type_field).as_string();
            let id = record.get_value(&def.id_field).key();
            let loader = Arc::clone(&loader);
            async move {
                let Some(kind) = kind.filter(|_| !id.is_null()) else {
                    return Value::Null;
                };
                let key = PolymorphicKey { kind, id };
                match loader.load(key.clone()).await {
                    Ok(row) => Value::Record(row),
                    Err(err) => {
                        warn!(
                            table,
                            relation = %relation.name,
                            key = %key,
                            error = %err,
                            "Failed to load relation, using empty value"
                        );
                        Value::Null
                    }
                }
            }
        });

        join_all(loads).await
    }

    async fn relation_loader(
        &self,
        table: &str,
        relation: &RelationDef,
    ) -> Arc<DataLoader<RelationBatch>> {
        let mut loaders = self.loaders.lock().await;
        let loader = loaders
            .entry(format!("{table}.{}", relation.name))
            .or_insert_with(|| {
                DataLoader::new(
                    RelationBatch::new(
                        Arc::clone(&self.executor),
                        self.transformer.clone(),
                        relation.kind.clone(),
                    ),
                    self.config.loader,
                )
            });
        Arc::clone(loader)
    }

    async fn polymorphic_loader(
        &self,
        table: &str,
        relation: &RelationDef,
        def: &PolymorphicDef,
    ) -> Arc<DataLoader<PolymorphicBatch>> {
        let mut loaders = self.polymorphic_loaders.lock().await;
        let loader = loaders
            .entry(format!("{table}.{}", relation.name))
            .or_insert_with(|| {
                DataLoader::new(
                    PolymorphicBatch::new(
                        Arc::clone(&self.executor),
                        self.transformer.clone(),
                        def.clone(),
                    ),
                    self.config.loader,
                )
            });
        Arc::clone(loader)
    }
}
