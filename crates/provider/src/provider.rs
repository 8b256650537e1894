use crate::{
    error::ProviderError,
    params::{GetListParams, GetListResult},
};
use connectors::{ExecutorExt, SqlExecutor};
use engine_config::{ConfigError, ProviderSettings, SchemaValidator, SettingsValidator};
use model::{
    core::value::Value,
    query::{filter::Filter, pagination::Pagination},
    records::record::Record,
    schema::table::{Schema, TableDef},
};
use planner::{QueryTransformer, SelectOptions};
use relations::{LoaderConfig, RelationshipResolver, ResolverConfig};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Refine's data-provider operations on top of one SQL executor.
///
/// The schema is validated once here. Compilation is stateless; each call that
/// loads relations gets a fresh resolver, so loader caches never outlive it.
pub struct DataProvider {
    executor: Arc<dyn SqlExecutor>,
    schema: Arc<Schema>,
    settings: ProviderSettings,
    transformer: QueryTransformer,
}

impl DataProvider {
    pub fn new(
        executor: Arc<dyn SqlExecutor>,
        schema: Schema,
        settings: ProviderSettings,
    ) -> Result<Self, ProviderError> {
        SettingsValidator::validate(&settings).map_err(ConfigError::Settings)?;

        let mut report = SchemaValidator::validate(&schema);
        if settings.strict_schema {
            report = report.promote_warnings();
        }
        for finding in &report.warnings {
            warn!(code = %finding.code, "{}", finding.message);
        }
        report.into_result()?;

        let kind = executor.kind();
        if kind.dialect() != settings.dialect {
            warn!(
                executor = ?kind,
                configured = %settings.dialect,
                "Configured dialect differs from the executor, compiling for the executor"
            );
        }
        info!(tables = schema.len(), dialect = %kind.dialect(), "Data provider ready");

        Ok(Self {
            transformer: QueryTransformer::new(kind.dialect()),
            executor,
            schema: Arc::new(schema),
            settings,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    pub async fn get_list(
        &self,
        resource: &str,
        params: &GetListParams,
    ) -> Result<GetListResult, ProviderError> {
        self.table(resource)?;

        let pagination = params.pagination.unwrap_or(Pagination::Page {
            current: 1,
            page_size: self.settings.default_page_size,
        });
        let options = SelectOptions::new()
            .filters(params.filters.clone())
            .sorters(params.sorters.clone())
            .paginate(pagination);

        let select = self.transformer.build_select_query(resource, &options)?;
        let count = self
            .transformer
            .build_count_query(resource, &params.filters)?;

        let rows = self.executor.fetch(&select).await?;
        let total = self
            .executor
            .fetch(&count)
            .await?
            .first()
            .and_then(|row| row.get_value("total").as_i64())
            .map_or(0, |n| n.max(0) as u64);

        let data = self
            .with_relations(resource, rows, params.relations.as_slice())
            .await?;
        debug!(resource, rows = data.len(), total, "getList");
        Ok(GetListResult { data, total })
    }

    pub async fn get_one<P: AsRef<str>>(
        &self,
        resource: &str,
        id: impl Into<Value>,
        relations: &[P],
    ) -> Result<Record, ProviderError> {
        let id = id.into();
        let row = self
            .find_by_ids(resource, vec![id.clone()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NotFound {
                resource: resource.to_string(),
                id: id.to_string(),
            })?;

        let mut rows = self.with_relations(resource, vec![row], relations).await?;
        rows.pop().ok_or_else(|| ProviderError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        })
    }

    /// Rows come back in database order; unknown ids are skipped.
    pub async fn get_many<P: AsRef<str>>(
        &self,
        resource: &str,
        ids: Vec<Value>,
        relations: &[P],
    ) -> Result<Vec<Record>, ProviderError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self.find_by_ids(resource, ids).await?;
        self.with_relations(resource, rows, relations).await
    }

    /// Inserts one row and returns it as stored.
    ///
    /// The row is read back through `last_insert_id` (or the primary key given
    /// in `values`); when neither is known the input is returned as is.
    pub async fn create(&self, resource: &str, values: Record) -> Result<Record, ProviderError> {
        let pk = self.primary_key(resource)?;
        let query = self.transformer.build_insert_query(resource, &values)?;
        let result = self.executor.apply(&query).await?;

        let id = result
            .last_insert_id
            .filter(|id| !id.is_null())
            .or_else(|| values.get(&pk).cloned());
        debug!(resource, id = ?id, "create");

        match id {
            Some(id) => Ok(self
                .find_by_ids(resource, vec![id])
                .await?
                .into_iter()
                .next()
                .unwrap_or(values)),
            None => Ok(values),
        }
    }

    /// One multi-row INSERT. Returns the inputs; drivers only report the
    /// last generated id.
    pub async fn create_many(
        &self,
        resource: &str,
        rows: Vec<Record>,
    ) -> Result<Vec<Record>, ProviderError> {
        self.table(resource)?;
        let query = self.transformer.build_insert_many_query(resource, &rows)?;
        let result = self.executor.apply(&query).await?;
        debug!(resource, changes = result.changes, "createMany");
        Ok(rows)
    }

    pub async fn update(
        &self,
        resource: &str,
        id: impl Into<Value>,
        values: Record,
    ) -> Result<Record, ProviderError> {
        let id = id.into();
        let changes = self.update_where(resource, vec![id.clone()], &values).await?;
        if changes == 0 {
            return Err(ProviderError::NotFound {
                resource: resource.to_string(),
                id: id.to_string(),
            });
        }
        let empty: &[&str] = &[];
        self.get_one(resource, id, empty).await
    }

    /// Applies the same values to every id and returns the updated rows.
    pub async fn update_many(
        &self,
        resource: &str,
        ids: Vec<Value>,
        values: Record,
    ) -> Result<Vec<Record>, ProviderError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.update_where(resource, ids.clone(), &values).await?;
        self.find_by_ids(resource, ids).await
    }

    /// Deletes one row and returns it as it was.
    pub async fn delete_one(
        &self,
        resource: &str,
        id: impl Into<Value>,
    ) -> Result<Record, ProviderError> {
        let id = id.into();
        let mut deleted = self.delete_where(resource, vec![id.clone()]).await?;
        deleted.pop().ok_or_else(|| ProviderError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        })
    }

    pub async fn delete_many(
        &self,
        resource: &str,
        ids: Vec<Value>,
    ) -> Result<Vec<Record>, ProviderError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.delete_where(resource, ids).await
    }

    async fn update_where(
        &self,
        resource: &str,
        ids: Vec<Value>,
        values: &Record,
    ) -> Result<u64, ProviderError> {
        let filter = self.id_filter(resource, ids)?;
        let query = self
            .transformer
            .build_update_query(resource, values, &[filter])?;
        let result = self.executor.apply(&query).await?;
        debug!(resource, changes = result.changes, "update");
        Ok(result.changes)
    }

    async fn delete_where(
        &self,
        resource: &str,
        ids: Vec<Value>,
    ) -> Result<Vec<Record>, ProviderError> {
        let existing = self.find_by_ids(resource, ids.clone()).await?;
        if existing.is_empty() {
            return Ok(existing);
        }

        let filter = self.id_filter(resource, ids)?;
        let query = self.transformer.build_delete_query(resource, &[filter])?;
        let result = self.executor.apply(&query).await?;
        debug!(resource, changes = result.changes, "delete");
        Ok(existing)
    }

    async fn find_by_ids(
        &self,
        resource: &str,
        ids: Vec<Value>,
    ) -> Result<Vec<Record>, ProviderError> {
        let filter = self.id_filter(resource, ids)?;
        let query = self
            .transformer
            .build_select_query(resource, &SelectOptions::new().filters(vec![filter]))?;
        Ok(self.executor.fetch(&query).await?)
    }

    /// `pk = ?` for one id, `pk IN (...)` for several.
    fn id_filter(&self, resource: &str, mut ids: Vec<Value>) -> Result<Filter, ProviderError> {
        let pk = self.primary_key(resource)?;
        if ids.len() == 1 {
            if let Some(id) = ids.pop() {
                return Ok(Filter::eq(&pk, id));
            }
        }
        Ok(Filter::in_list(&pk, ids))
    }

    async fn with_relations<P: AsRef<str>>(
        &self,
        resource: &str,
        rows: Vec<Record>,
        relations: &[P],
    ) -> Result<Vec<Record>, ProviderError> {
        if relations.is_empty() {
            return Ok(rows);
        }
        Ok(self
            .resolver()
            .load_relationships(resource, rows, relations)
            .await?)
    }

    fn resolver(&self) -> RelationshipResolver {
        let config = ResolverConfig {
            max_depth: self.settings.max_relation_depth,
            loader: LoaderConfig {
                batch_window: self.settings.loader.batch_window(),
                max_batch_size: self.settings.loader.max_batch_size,
            },
        };
        RelationshipResolver::new(Arc::clone(&self.executor), Arc::clone(&self.schema), config)
    }

    fn table(&self, resource: &str) -> Result<&TableDef, ProviderError> {
        self.schema
            .table(resource)
            .ok_or_else(|| ProviderError::UnknownResource(resource.to_string()))
    }

    fn primary_key(&self, resource: &str) -> Result<String, ProviderError> {
        Ok(self
            .table(resource)?
            .primary_key()
            .unwrap_or("id")
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::{DbError, ExecutorLayers, retry::RetryPolicy, testing::MemoryExecutor};
    use model::{
        core::data_type::DataType,
        query::{filter::Operator, sort::Sorter},
        schema::relation::RelationDef,
    };
    use planner::QueryError;
    use serde_json::json;
    use std::time::Duration;
    use tracing_test::traced_test;

    const NO_RELATIONS: &[&str] = &[];

    fn schema() -> Schema {
        Schema::new()
            .with_table(
                "users",
                TableDef::new()
                    .primary("id", DataType::Integer)
                    .column("name", DataType::Text),
            )
            .with_table(
                "posts",
                TableDef::new()
                    .primary("id", DataType::Integer)
                    .column("title", DataType::Text)
                    .column("status", DataType::Text)
                    .column("author_id", DataType::Integer)
                    .relation(RelationDef::belongs_to("author", "users", "author_id")),
            )
    }

    async fn provider() -> (MemoryExecutor, DataProvider) {
        let memory = MemoryExecutor::new().await.unwrap();
        memory
            .seed(
                "users",
                vec![
                    Record::new().with("id", 1).with("name", "Ada"),
                    Record::new().with("id", 2).with("name", "Grace"),
                ],
            )
            .await
            .unwrap();
        let posts = (1..=25)
            .map(|i| {
                Record::new()
                    .with("id", i)
                    .with("title", format!("Post {i}"))
                    .with("status", if i % 5 == 0 { "draft" } else { "published" })
                    .with("author_id", 1 + i % 2)
            })
            .collect();
        memory.seed("posts", posts).await.unwrap();

        let provider =
            DataProvider::new(Arc::new(memory.clone()), schema(), ProviderSettings::default())
                .unwrap();
        (memory, provider)
    }

    #[tokio::test]
    async fn test_get_list_pages_and_counts() {
        let (memory, provider) = provider().await;
        let params = GetListParams::new()
            .filter(Filter::eq("status", "published"))
            .sort(Sorter::desc("id"))
            .paginate(Pagination::page(2, 5));

        let result = provider.get_list("posts", &params).await.unwrap();

        assert_eq!(result.total, 20);
        let ids: Vec<_> = result.data.iter().map(|r| r.get_value("id")).collect();
        assert_eq!(
            ids,
            vec![Value::Int(18), Value::Int(17), Value::Int(16), Value::Int(14), Value::Int(13)]
        );
        assert_eq!(
            memory.statements().await,
            vec![
                "SELECT * FROM posts WHERE status = ? ORDER BY id DESC LIMIT ? OFFSET ?",
                "SELECT COUNT(*) AS total FROM posts WHERE status = ?",
            ]
        );
    }

    #[tokio::test]
    async fn test_get_list_defaults_to_configured_page_size() {
        let (_, provider) = provider().await;
        let result = provider
            .get_list("posts", &GetListParams::new())
            .await
            .unwrap();

        assert_eq!(result.data.len(), 10);
        assert_eq!(result.total, 25);
    }

    #[tokio::test]
    async fn test_get_list_with_or_group() {
        let (_, provider) = provider().await;
        let params = GetListParams::new()
            .filter(Filter::or(vec![
                Filter::eq("status", "draft"),
                Filter::eq("id", 1),
            ]))
            .sort(Sorter::asc("id"))
            .paginate(Pagination::Off);

        let result = provider.get_list("posts", &params).await.unwrap();
        let ids: Vec<_> = result.data.iter().map(|r| r.get_value("id")).collect();
        assert_eq!(ids, [1, 5, 10, 15, 20, 25].map(Value::Int).to_vec());
        assert_eq!(result.total, 6);
    }

    #[tokio::test]
    async fn test_text_operators_respect_case() {
        let (_, provider) = provider().await;
        let titles = |operator, text: &str| {
            GetListParams::new()
                .filter(Filter::leaf("title", operator, text))
                .paginate(Pagination::Off)
        };

        let sensitive = provider
            .get_list("posts", &titles(Operator::ContainsS, "post 1"))
            .await
            .unwrap();
        assert_eq!(sensitive.total, 0);

        let exact = provider
            .get_list("posts", &titles(Operator::ContainsS, "Post 1"))
            .await
            .unwrap();
        assert_eq!(exact.total, 11);

        let insensitive = provider
            .get_list("posts", &titles(Operator::Contains, "post 1"))
            .await
            .unwrap();
        assert_eq!(insensitive.total, 11);
    }

    #[tokio::test]
    async fn test_like_wildcards_in_values_match_literally() {
        let (_, provider) = provider().await;
        provider
            .create("users", Record::new().with("name", "100% done"))
            .await
            .unwrap();
        provider
            .create("users", Record::new().with("name", "snake_case"))
            .await
            .unwrap();

        let names = |text: &str| {
            GetListParams::new()
                .filter(Filter::contains("name", text))
                .paginate(Pagination::Off)
        };
        let percent = provider.get_list("users", &names("0%")).await.unwrap();
        assert_eq!(percent.total, 1);
        let underscore = provider.get_list("users", &names("e_c")).await.unwrap();
        assert_eq!(underscore.total, 1);
        let none = provider.get_list("users", &names("a_a")).await.unwrap();
        assert_eq!(none.total, 0);
    }

    #[tokio::test]
    async fn test_get_list_reads_refine_json_and_loads_relations() {
        let (_, provider) = provider().await;
        let params: GetListParams = serde_json::from_value(json!({
            "filters": [{"field": "id", "operator": "in", "value": [1, 2]}],
            "pagination": {"mode": "off"},
            "relations": ["author"]
        }))
        .unwrap();

        let result = provider.get_list("posts", &params).await.unwrap();
        let authors: Vec<_> = result
            .data
            .iter()
            .map(|post| post.get("author").and_then(Value::as_record).unwrap().get_value("name"))
            .collect();
        assert_eq!(authors, vec![Value::from("Grace"), Value::from("Ada")]);
    }

    #[tokio::test]
    async fn test_get_one_and_missing_id() {
        let (_, provider) = provider().await;
        let post = provider.get_one("posts", 3, &["author"]).await.unwrap();
        assert_eq!(post.get_value("title"), Value::from("Post 3"));
        assert!(post.get("author").and_then(Value::as_record).is_some());

        let err = provider.get_one("posts", 999, NO_RELATIONS).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_many() {
        let (_, provider) = provider().await;
        let rows = provider
            .get_many("posts", vec![Value::Int(4), Value::Int(5), Value::Int(404)], NO_RELATIONS)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_create_reads_back_generated_id() {
        let (_, provider) = provider().await;
        let created = provider
            .create(
                "posts",
                Record::new()
                    .with("title", "Fresh")
                    .with("status", "draft")
                    .with("author_id", 2),
            )
            .await
            .unwrap();

        assert_eq!(created.get("id"), Some(&Value::Int(26)));
        assert_eq!(created.get_value("title"), Value::from("Fresh"));
    }

    #[tokio::test]
    async fn test_create_many_uses_one_statement() {
        let (memory, provider) = provider().await;
        let rows = vec![
            Record::new().with("name", "Linus"),
            Record::new().with("name", "Barbara"),
        ];
        provider.create_many("users", rows).await.unwrap();

        assert_eq!(memory.statements().await.len(), 1);
        assert_eq!(memory.rows("users").await.len(), 4);
    }

    #[tokio::test]
    async fn test_update_and_update_many() {
        let (_, provider) = provider().await;
        let updated = provider
            .update("posts", 1, Record::new().with("title", "Renamed"))
            .await
            .unwrap();
        assert_eq!(updated.get_value("title"), Value::from("Renamed"));

        let rows = provider
            .update_many(
                "posts",
                vec![Value::Int(2), Value::Int(3)],
                Record::new().with("status", "archived"),
            )
            .await
            .unwrap();
        assert!(rows.iter().all(|r| r.get_value("status") == Value::from("archived")));

        let err = provider
            .update("posts", 999, Record::new().with("title", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_empty_update_is_rejected_before_execution() {
        let (memory, provider) = provider().await;
        let err = provider.update("posts", 1, Record::new()).await.unwrap_err();

        assert!(matches!(err, ProviderError::Query(QueryError::EmptyValues { .. })));
        assert!(memory.statements().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_returns_removed_rows() {
        let (memory, provider) = provider().await;
        let deleted = provider.delete_one("posts", 7).await.unwrap();
        assert_eq!(deleted.get_value("id"), Value::Int(7));

        let deleted = provider
            .delete_many("posts", vec![Value::Int(8), Value::Int(9)])
            .await
            .unwrap();
        assert_eq!(deleted.len(), 2);
        assert_eq!(memory.rows("posts").await.len(), 22);

        let err = provider.delete_one("posts", 7).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_execution_errors_carry_the_statement() {
        let (memory, provider) = provider().await;
        memory
            .fail_when("FROM posts", DbError::Constraint("disk full".into()))
            .await;

        let err = provider
            .get_list("posts", &GetListParams::new())
            .await
            .unwrap_err();
        match err {
            ProviderError::Execution(err) => {
                assert!(err.sql.starts_with("SELECT * FROM posts"));
                assert_eq!(err.source, DbError::Constraint("disk full".into()));
            }
            other => panic!("expected an execution error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried_through_layers() {
        let (memory, _) = provider().await;
        let executor = memory
            .clone()
            .with_retry(RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(5)))
            .with_logging();
        let provider =
            DataProvider::new(Arc::new(executor), schema(), ProviderSettings::default()).unwrap();

        memory.fail_next(1, DbError::Busy("locked".into())).await;
        let post = provider.get_one("posts", 2, NO_RELATIONS).await.unwrap();

        assert_eq!(post.get_value("id"), Value::Int(2));
        assert_eq!(memory.statements().await.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_resource() {
        let (_, provider) = provider().await;
        let err = provider
            .get_list("ghosts", &GetListParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(ref r) if r == "ghosts"));
    }

    #[tokio::test]
    async fn test_invalid_schema_aborts_construction() {
        let schema = Schema::new().with_table(
            "posts",
            TableDef::new()
                .primary("id", DataType::Integer)
                .relation(RelationDef::belongs_to("author", "users", "author_id")),
        );
        let result = DataProvider::new(
            Arc::new(MemoryExecutor::new().await.unwrap()),
            schema,
            ProviderSettings::default(),
        );
        assert!(matches!(result, Err(ProviderError::Config(_))));
    }

    #[tokio::test]
    async fn test_invalid_settings_abort_construction() {
        let settings = ProviderSettings {
            default_page_size: 0,
            ..ProviderSettings::default()
        };
        let result = DataProvider::new(
            Arc::new(MemoryExecutor::new().await.unwrap()),
            schema(),
            settings,
        );
        assert!(matches!(
            result,
            Err(ProviderError::Config(ConfigError::Settings(_)))
        ));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_schema_warnings_are_logged_or_promoted() {
        let schema = Schema::new().with_table("tags", TableDef::new().column("label", DataType::Text));

        let lenient = DataProvider::new(
            Arc::new(MemoryExecutor::new().await.unwrap()),
            schema.clone(),
            ProviderSettings::default(),
        );
        assert!(lenient.is_ok());
        assert!(logs_contain("no detectable primary key"));

        let strict = DataProvider::new(
            Arc::new(MemoryExecutor::new().await.unwrap()),
            schema,
            ProviderSettings {
                strict_schema: true,
                ..ProviderSettings::default()
            },
        );
        assert!(strict.is_err());
    }
}
