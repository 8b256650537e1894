use crate::{
    error::DbError,
    retry::{RetryDisposition, RetryError, RetryPolicy},
    sql::base::adapter::{DatabaseKind, QueryRows, RunResult, SqlExecutor},
};
use async_trait::async_trait;
use model::core::value::Value;
use tracing::warn;

/// Retries transient driver errors (`Connection`, `Busy`) with backoff.
///
/// Mutating statements are retried too; drivers only report `Busy` when the
/// statement was not applied.
#[derive(Debug, Clone)]
pub struct RetryingExecutor<E> {
    inner: E,
    policy: RetryPolicy,
}

impl<E> RetryingExecutor<E> {
    pub fn new(inner: E, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

fn classify(err: &DbError) -> RetryDisposition {
    if err.is_transient() {
        warn!(error = %err, "Transient database error, retrying");
        RetryDisposition::Retry
    } else {
        RetryDisposition::Stop
    }
}

fn flatten(err: RetryError<DbError>) -> DbError {
    match err {
        RetryError::Fatal(err) => err,
        RetryError::AttemptsExceeded { attempts, last } => DbError::RetriesExhausted {
            attempts,
            last: Box::new(last),
        },
    }
}

#[async_trait]
impl<E: SqlExecutor> SqlExecutor for RetryingExecutor<E> {
    async fn execute(&self, sql: &str, args: &[Value]) -> Result<QueryRows, DbError> {
        self.policy
            .run(|| self.inner.execute(sql, args), classify)
            .await
            .map_err(flatten)
    }

    async fn run(&self, sql: &str, args: &[Value]) -> Result<RunResult, DbError> {
        self.policy
            .run(|| self.inner.run(sql, args), classify)
            .await
            .map_err(flatten)
    }

    fn kind(&self) -> DatabaseKind {
        self.inner.kind()
    }
}
