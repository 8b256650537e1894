use connectors::ExecutionError;
use engine_config::ConfigError;
use planner::QueryError;
use relations::RelationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Resource '{0}' is not declared in the schema")]
    UnknownResource(String),

    #[error("No {resource} record with id {id}")]
    NotFound { resource: String, id: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Relation(#[from] RelationError),
}
