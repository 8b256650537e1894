//! A recording [`SqlExecutor`] for tests, backed by a private in-memory
//! SQLite database.
//!
//! Every statement is recorded so tests can count round trips, and failures
//! can be injected ahead of the driver.

use crate::{
    error::DbError,
    sql::{
        base::adapter::{DatabaseKind, QueryRows, RunResult, SqlExecutor},
        sqlite::adapter::SqliteExecutor,
    },
};
use async_trait::async_trait;
use model::{core::value::Value, records::record::Record};
use planner::QueryTransformer;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct MemoryExecutor {
    inner: SqliteExecutor,
    state: Arc<Mutex<TestState>>,
}

#[derive(Debug, Default)]
struct TestState {
    statements: Vec<String>,
    fail_next: Option<(usize, DbError)>,
    fail_rules: Vec<(String, DbError)>,
}

impl MemoryExecutor {
    pub async fn new() -> Result<Self, DbError> {
        Ok(Self {
            inner: SqliteExecutor::in_memory().await?,
            state: Arc::default(),
        })
    }

    /// Creates (or replaces) a table holding `rows`. Seeding is not recorded.
    ///
    /// Columns are the union of the rows' fields. An `id` column whose values
    /// are all integers becomes the rowid, so later inserts get generated ids.
    pub async fn seed(&self, table: &str, rows: Vec<Record>) -> Result<(), DbError> {
        let mut columns: Vec<&String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.contains(&key) {
                    columns.push(key);
                }
            }
        }
        let integer_ids = rows
            .iter()
            .all(|row| matches!(row.get_value("id"), Value::Int(_) | Value::Uint(_)));

        let mut definitions: Vec<String> = columns
            .iter()
            .map(|column| {
                if column.as_str() == "id" && integer_ids {
                    r#""id" INTEGER PRIMARY KEY"#.to_string()
                } else {
                    quote(column)
                }
            })
            .collect();
        if definitions.is_empty() {
            definitions.push(r#""id" INTEGER PRIMARY KEY"#.to_string());
        }

        let table_name = quote(table);
        self.inner
            .run(&format!("DROP TABLE IF EXISTS {table_name}"), &[])
            .await?;
        self.inner
            .run(
                &format!("CREATE TABLE {table_name} ({})", definitions.join(", ")),
                &[],
            )
            .await?;

        let transformer = QueryTransformer::default();
        for row in rows.iter().filter(|row| !row.is_empty()) {
            let insert = transformer
                .build_insert_query(table, row)
                .map_err(|e| DbError::Sql(e.to_string()))?;
            self.inner.run(&insert.sql, &insert.args).await?;
        }
        Ok(())
    }

    /// Current contents of `table`, empty if it does not exist. Not recorded.
    pub async fn rows(&self, table: &str) -> Vec<Record> {
        self.inner
            .execute(&format!("SELECT * FROM {}", quote(table)), &[])
            .await
            .map(|result| result.rows)
            .unwrap_or_default()
    }

    /// Fails the next `times` statements with `error`.
    pub async fn fail_next(&self, times: usize, error: DbError) {
        self.state.lock().await.fail_next = Some((times, error));
    }

    /// Fails every statement whose SQL contains `pattern`.
    pub async fn fail_when(&self, pattern: &str, error: DbError) {
        self.state
            .lock()
            .await
            .fail_rules
            .push((pattern.to_string(), error));
    }

    /// Every statement received so far, failed ones included.
    pub async fn statements(&self) -> Vec<String> {
        self.state.lock().await.statements.clone()
    }

    /// Number of SELECT statements issued against `table`.
    pub async fn select_count(&self, table: &str) -> usize {
        self.state
            .lock()
            .await
            .statements
            .iter()
            .filter(|sql| {
                sql.starts_with("SELECT")
                    && sql.split_once("FROM ").is_some_and(|(_, rest)| {
                        rest.split_whitespace()
                            .next()
                            .is_some_and(|name| name.trim_matches('"') == table)
                    })
            })
            .count()
    }

    pub async fn clear_statements(&self) {
        self.state.lock().await.statements.clear();
    }

    async fn record(&self, sql: &str) -> Result<(), DbError> {
        let mut state = self.state.lock().await;
        state.statements.push(sql.to_string());

        if let Some((remaining, error)) = state.fail_next.take() {
            if remaining > 1 {
                state.fail_next = Some((remaining - 1, error.clone()));
            }
            if remaining > 0 {
                return Err(error);
            }
        }
        match state
            .fail_rules
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
        {
            Some((_, error)) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SqlExecutor for MemoryExecutor {
    async fn execute(&self, sql: &str, args: &[Value]) -> Result<QueryRows, DbError> {
        self.record(sql).await?;
        self.inner.execute(sql, args).await
    }

    async fn run(&self, sql: &str, args: &[Value]) -> Result<RunResult, DbError> {
        self.record(sql).await?;
        self.inner.run(sql, args).await
    }

    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Sqlite
    }
}

fn quote(ident: &str) -> String {
    format!(r#""{}""#, ident.replace('"', r#""""#))
}
