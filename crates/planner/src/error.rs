use model::query::error::FilterError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Invalid value for '{operator}' on '{field}': {reason}")]
    InvalidFilterValue {
        field: String,
        operator: String,
        reason: String,
    },

    #[error("Unknown filter operator: '{0}'")]
    UnknownOperator(String),

    #[error("Refusing to build {statement} on '{table}' without a WHERE clause")]
    MissingWhereClause {
        statement: &'static str,
        table: String,
    },

    #[error("Invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("{statement} on '{table}' has no values")]
    EmptyValues {
        statement: &'static str,
        table: String,
    },

    #[error("Row {row} inserted into '{table}' does not have the same columns as the first row")]
    InconsistentRows { table: String, row: usize },

    #[error("Invalid sort order: '{0}'")]
    InvalidSortOrder(String),

    #[error("Malformed filter: {0}")]
    MalformedFilter(String),
}

impl QueryError {
    pub(crate) fn invalid_value(field: &str, operator: impl ToString, reason: &str) -> Self {
        QueryError::InvalidFilterValue {
            field: field.to_string(),
            operator: operator.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<FilterError> for QueryError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::UnknownOperator(op) => QueryError::UnknownOperator(op),
            FilterError::InvalidValue { operator, reason } => QueryError::InvalidFilterValue {
                field: String::new(),
                operator,
                reason,
            },
            FilterError::InvalidSortOrder(order) => QueryError::InvalidSortOrder(order),
            FilterError::Malformed(msg) => QueryError::MalformedFilter(msg),
        }
    }
}
