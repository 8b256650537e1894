use connectors::ExecutionError;
use planner::QueryError;
use thiserror::Error;

/// Why a single `DataLoader::load` call did not produce a value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoaderError {
    #[error("No row found for key {0}")]
    NotFound(String),

    /// The batch query itself failed; every key in the batch gets this.
    #[error("Batch load failed: {0}")]
    Batch(String),

    #[error("Loader was dropped before the batch completed")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum RelationError {
    #[error("Table '{0}' is not declared in the schema")]
    UnknownTable(String),

    #[error("Relation '{relation}' is not declared on table '{table}'")]
    RelationNotFound { table: String, relation: String },

    #[error("Relation path '{path}' is {requested} levels deep, the maximum is {max}")]
    RelationDepthExceeded {
        path: String,
        requested: usize,
        max: usize,
    },

    #[error("Invalid relation path '{0}'")]
    InvalidPath(String),

    /// Nested paths need a fixed target table, which polymorphic relations lack.
    #[error("Cannot load '{path}' through polymorphic relation '{relation}'")]
    NestedPolymorphic { path: String, relation: String },

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}
