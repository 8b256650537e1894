//! Wrappers that add behaviour around any [`SqlExecutor`].

use crate::{
    retry::RetryPolicy,
    sql::{
        base::adapter::SqlExecutor,
        middleware::{logging::LoggingExecutor, retry::RetryingExecutor},
    },
};

pub mod logging;
pub mod retry;

/// Builder-style helpers for stacking middleware:
///
/// ```ignore
/// let executor = driver.with_retry(RetryPolicy::default()).with_logging();
/// ```
pub trait ExecutorLayers: SqlExecutor + Sized {
    fn with_logging(self) -> LoggingExecutor<Self> {
        LoggingExecutor::new(self)
    }

    fn with_retry(self, policy: RetryPolicy) -> RetryingExecutor<Self> {
        RetryingExecutor::new(self, policy)
    }
}

impl<T: SqlExecutor + Sized> ExecutorLayers for T {}
