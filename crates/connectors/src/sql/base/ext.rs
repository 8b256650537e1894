use crate::{
    error::ExecutionError,
    sql::base::adapter::{RunResult, SqlExecutor},
};
use async_trait::async_trait;
use model::records::record::Record;
use planner::CompiledQuery;

/// Runs compiled queries, attaching the statement to any failure.
#[async_trait]
pub trait ExecutorExt: SqlExecutor {
    async fn fetch(&self, query: &CompiledQuery) -> Result<Vec<Record>, ExecutionError> {
        self.execute(&query.sql, &query.args)
            .await
            .map(|result| result.rows)
            .map_err(|err| ExecutionError::new(&query.sql, &query.args, err))
    }

    async fn apply(&self, query: &CompiledQuery) -> Result<RunResult, ExecutionError> {
        self.run(&query.sql, &query.args)
            .await
            .map_err(|err| ExecutionError::new(&query.sql, &query.args, err))
    }
}

impl<T: SqlExecutor + ?Sized> ExecutorExt for T {}
