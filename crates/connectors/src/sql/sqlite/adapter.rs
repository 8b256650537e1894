use crate::{
    error::DbError,
    sql::{
        base::adapter::{DatabaseKind, QueryRows, RunResult, SqlExecutor},
        sqlite::params::{bind_values, decode_row},
    },
};
use async_trait::async_trait;
use model::core::value::Value;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use tracing::info;

/// A [`SqlExecutor`] over an sqlx SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    /// Connects to a database URL such as `sqlite://data.db`.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let pool = SqlitePool::connect(url).await?;
        info!(url, "Connected to SQLite");
        Ok(Self { pool })
    }

    /// A private in-memory database.
    ///
    /// Every SQLite memory connection is its own database, so the pool holds
    /// exactly one connection and never recycles it.
    pub async fn in_memory() -> Result<Self, DbError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl SqlExecutor for SqliteExecutor {
    async fn execute(&self, sql: &str, args: &[Value]) -> Result<QueryRows, DbError> {
        let rows = bind_values(sqlx::query(sql), args)
            .fetch_all(&self.pool)
            .await?;
        let rows = rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>()?;
        Ok(QueryRows { rows })
    }

    async fn run(&self, sql: &str, args: &[Value]) -> Result<RunResult, DbError> {
        let result = bind_values(sqlx::query(sql), args)
            .execute(&self.pool)
            .await?;

        // last_insert_rowid() is per connection and outlives the INSERT.
        let is_insert = sql
            .trim_start()
            .get(..6)
            .is_some_and(|verb| verb.eq_ignore_ascii_case("INSERT"));
        Ok(RunResult {
            changes: result.rows_affected(),
            last_insert_id: is_insert.then(|| Value::Int(result.last_insert_rowid())),
        })
    }

    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Sqlite
    }
}
