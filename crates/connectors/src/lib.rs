//! The SQL-execution seam between the query core and a concrete driver.
//!
//! Drivers implement [`SqlExecutor`]; cross-cutting behaviour (logging,
//! retries) is layered on at construction time with [`ExecutorLayers`].

pub mod error;
pub mod retry;
pub mod sql;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{DbError, ExecutionError};
pub use sql::base::{
    adapter::{DatabaseKind, QueryRows, RunResult, SqlExecutor},
    ext::ExecutorExt,
};
pub use sql::middleware::{ExecutorLayers, logging::LoggingExecutor, retry::RetryingExecutor};
pub use sql::sqlite::adapter::SqliteExecutor;
