use thiserror::Error;

/// Errors raised while reading query inputs (filters, sorters, pagination).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Unknown filter operator: '{0}'")]
    UnknownOperator(String),

    #[error("Invalid value for operator '{operator}': {reason}")]
    InvalidValue { operator: String, reason: String },

    #[error("Invalid sort order '{0}', expected 'asc' or 'desc'")]
    InvalidSortOrder(String),

    #[error("Malformed filter: {0}")]
    Malformed(String),
}
