use crate::{
    error::DbError,
    sql::base::adapter::{DatabaseKind, QueryRows, RunResult, SqlExecutor},
};
use async_trait::async_trait;
use model::core::value::Value;
use std::time::Instant;
use tracing::{debug, error};

/// Logs every statement at `debug` and every failure at `error`.
#[derive(Debug, Clone)]
pub struct LoggingExecutor<E> {
    inner: E,
}

impl<E> LoggingExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

#[async_trait]
impl<E: SqlExecutor> SqlExecutor for LoggingExecutor<E> {
    async fn execute(&self, sql: &str, args: &[Value]) -> Result<QueryRows, DbError> {
        let started = Instant::now();
        match self.inner.execute(sql, args).await {
            Ok(result) => {
                debug!(
                    sql,
                    args = args.len(),
                    rows = result.rows.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Query executed"
                );
                Ok(result)
            }
            Err(err) => {
                error!(sql, args = args.len(), error = %err, "Query failed");
                Err(err)
            }
        }
    }

    async fn run(&self, sql: &str, args: &[Value]) -> Result<RunResult, DbError> {
        let started = Instant::now();
        match self.inner.run(sql, args).await {
            Ok(result) => {
                debug!(
                    sql,
                    args = args.len(),
                    changes = result.changes,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Statement executed"
                );
                Ok(result)
            }
            Err(err) => {
                error!(sql, args = args.len(), error = %err, "Statement failed");
                Err(err)
            }
        }
    }

    fn kind(&self) -> DatabaseKind {
        self.inner.kind()
    }
}
