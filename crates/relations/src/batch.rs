//! Batch loaders that turn a set of keys into one query per relation
//! (two for belongsToMany, one per discriminator for polymorphic).

use crate::{error::RelationError, loader::BatchLoad};
use async_trait::async_trait;
use connectors::{ExecutorExt, SqlExecutor};
use indexmap::{IndexMap, IndexSet};
use model::{
    core::value::Value,
    query::filter::Filter,
    records::record::Record,
    schema::relation::{PolymorphicDef, RelationKind},
};
use planner::{QueryTransformer, SelectOptions};
use std::{collections::HashMap, fmt, sync::Arc};
use tracing::debug;

/// `SELECT * FROM table WHERE column IN (keys)`.
async fn fetch_in(
    executor: &Arc<dyn SqlExecutor>,
    transformer: &QueryTransformer,
    table: &str,
    column: &str,
    keys: Vec<Value>,
) -> Result<Vec<Record>, RelationError> {
    let options = SelectOptions::new().filters(vec![Filter::in_list(column, keys)]);
    let query = transformer.build_select_query(table, &options)?;
    Ok(executor.fetch(&query).await?)
}

fn group_by(rows: Vec<Record>, column: &str) -> HashMap<Value, Vec<Record>> {
    let mut groups: HashMap<Value, Vec<Record>> = HashMap::new();
    for row in rows {
        let key = row.get_value(column).key();
        if !key.is_null() {
            groups.entry(key).or_default().push(row);
        }
    }
    groups
}

/// Loads one non-polymorphic relation, keyed by the owning row's key value.
///
/// hasOne, hasMany and belongsToMany answer every requested key (possibly with
/// no rows). belongsTo only answers keys whose target exists, so a dangling
/// foreign key surfaces as not found.
pub struct RelationBatch {
    executor: Arc<dyn SqlExecutor>,
    transformer: QueryTransformer,
    kind: RelationKind,
}

impl RelationBatch {
    pub fn new(
        executor: Arc<dyn SqlExecutor>,
        transformer: QueryTransformer,
        kind: RelationKind,
    ) -> Self {
        Self {
            executor,
            transformer,
            kind,
        }
    }

    async fn load_pivot(
        &self,
        keys: &[Value],
        related_table: &str,
        pivot_table: &str,
        pivot_foreign_key: &str,
        pivot_related_key: &str,
        related_key: &str,
    ) -> Result<HashMap<Value, Vec<Record>>, RelationError> {
        let pivot_rows = fetch_in(
            &self.executor,
            &self.transformer,
            pivot_table,
            pivot_foreign_key,
            keys.to_vec(),
        )
        .await?;

        let mut links: Vec<(Value, Value)> = Vec::with_capacity(pivot_rows.len());
        let mut related_ids: IndexSet<Value> = IndexSet::new();
        for row in &pivot_rows {
            let owner = row.get_value(pivot_foreign_key).key();
            let related = row.get_value(pivot_related_key).key();
            if owner.is_null() || related.is_null() {
                continue;
            }
            related_ids.insert(related.clone());
            links.push((owner, related));
        }

        let mut grouped: HashMap<Value, Vec<Record>> =
            keys.iter().map(|key| (key.clone(), Vec::new())).collect();
        if related_ids.is_empty() {
            return Ok(grouped);
        }

        let related_rows = fetch_in(
            &self.executor,
            &self.transformer,
            related_table,
            related_key,
            related_ids.into_iter().collect(),
        )
        .await?;
        let by_id: HashMap<Value, Record> = related_rows
            .into_iter()
            .map(|row| (row.get_value(related_key).key(), row))
            .collect();

        for (owner, related) in links {
            if let (Some(rows), Some(row)) = (grouped.get_mut(&owner), by_id.get(&related)) {
                rows.push(row.clone());
            }
        }
        Ok(grouped)
    }
}

#[async_trait]
impl BatchLoad for RelationBatch {
    type Key = Value;
    type Value = Vec<Record>;
    type Error = RelationError;

    async fn load_batch(
        &self,
        keys: &[Value],
    ) -> Result<HashMap<Value, Vec<Record>>, RelationError> {
        debug!(relation = self.kind.type_name(), keys = keys.len(), "Loading relation batch");

        match &self.kind {
            RelationKind::HasOne {
                related_table,
                foreign_key,
                ..
            }
            | RelationKind::HasMany {
                related_table,
                foreign_key,
                ..
            } => {
                let rows = fetch_in(
                    &self.executor,
                    &self.transformer,
                    related_table,
                    foreign_key,
                    keys.to_vec(),
                )
                .await?;
                let mut groups = group_by(rows, foreign_key);
                for key in keys {
                    groups.entry(key.clone()).or_default();
                }
                Ok(groups)
            }
            RelationKind::BelongsTo {
                related_table,
                related_key,
                ..
            } => {
                let rows = fetch_in(
                    &self.executor,
                    &self.transformer,
                    related_table,
                    related_key,
                    keys.to_vec(),
                )
                .await?;
                Ok(group_by(rows, related_key))
            }
            RelationKind::BelongsToMany {
                related_table,
                pivot,
                related_key,
                ..
            } => {
                self.load_pivot(
                    keys,
                    related_table,
                    &pivot.table,
                    &pivot.foreign_key,
                    &pivot.related_key,
                    related_key,
                )
                .await
            }
            // Polymorphic relations are keyed by (type, id); see PolymorphicBatch.
            RelationKind::Polymorphic(_) => Ok(HashMap::new()),
        }
    }
}

/// A polymorphic lookup: the discriminator value and the target id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolymorphicKey {
    pub kind: String,
    pub id: Value,
}

impl fmt::Display for PolymorphicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Loads polymorphic targets with one query per discriminator value.
/// Unknown discriminators are left unanswered.
pub struct PolymorphicBatch {
    executor: Arc<dyn SqlExecutor>,
    transformer: QueryTransformer,
    def: PolymorphicDef,
}

impl PolymorphicBatch {
    pub fn new(
        executor: Arc<dyn SqlExecutor>,
        transformer: QueryTransformer,
        def: PolymorphicDef,
    ) -> Self {
        Self {
            executor,
            transformer,
            def,
        }
    }
}

#[async_trait]
impl BatchLoad for PolymorphicBatch {
    type Key = PolymorphicKey;
    type Value = Record;
    type Error = RelationError;

    async fn load_batch(
        &self,
        keys: &[PolymorphicKey],
    ) -> Result<HashMap<PolymorphicKey, Record>, RelationError> {
        let mut by_kind: IndexMap<&str, Vec<Value>> = IndexMap::new();
        for key in keys {
            by_kind.entry(key.kind.as_str()).or_default().push(key.id.clone());
        }

        let mut found = HashMap::new();
        for (kind, ids) in by_kind {
            let Some(table) = self.def.targets.get(kind) else {
                debug!(kind, "Skipping unknown polymorphic discriminator");
                continue;
            };

            let rows = fetch_in(
                &self.executor,
                &self.transformer,
                table,
                &self.def.target_key,
                ids,
            )
            .await?;
            for row in rows {
                let key = PolymorphicKey {
                    kind: kind.to_string(),
                    id: row.get_value(&self.def.target_key).key(),
                };
                found.insert(key, row);
            }
        }
        Ok(found)
    }
}
