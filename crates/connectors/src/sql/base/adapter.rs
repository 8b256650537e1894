use crate::error::DbError;
use async_trait::async_trait;
use model::{
    core::{data_type::SqlDialect, value::Value},
    records::record::Record,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseKind {
    Sqlite,
    MySql,
    Postgres,
    Other(String),
}

impl DatabaseKind {
    /// SQL dialect to compile for. Unknown backends get SQLite syntax.
    pub fn dialect(&self) -> SqlDialect {
        match self {
            DatabaseKind::MySql => SqlDialect::MySql,
            DatabaseKind::Postgres => SqlDialect::Postgres,
            DatabaseKind::Sqlite | DatabaseKind::Other(_) => SqlDialect::Sqlite,
        }
    }
}

/// Rows returned by a SELECT-shaped statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryRows {
    pub rows: Vec<Record>,
}

/// Outcome of a mutating statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunResult {
    pub changes: u64,
    pub last_insert_id: Option<Value>,
}

/// The only capability the query core needs from a driver.
///
/// Implementations translate this onto a vendor API (D1, bun:sqlite,
/// node:sqlite, better-sqlite3, a Postgres or MySQL pool). They never see
/// filters or relations, only finished SQL and positional arguments.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(&self, sql: &str, args: &[Value]) -> Result<QueryRows, DbError>;

    async fn run(&self, sql: &str, args: &[Value]) -> Result<RunResult, DbError>;

    fn kind(&self) -> DatabaseKind;
}

#[async_trait]
impl<T: SqlExecutor + ?Sized> SqlExecutor for Arc<T> {
    async fn execute(&self, sql: &str, args: &[Value]) -> Result<QueryRows, DbError> {
        (**self).execute(sql, args).await
    }

    async fn run(&self, sql: &str, args: &[Value]) -> Result<RunResult, DbError> {
        (**self).run(sql, args).await
    }

    fn kind(&self) -> DatabaseKind {
        (**self).kind()
    }
}
