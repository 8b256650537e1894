use model::core::value::Value;
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Failures reported by a driver.
///
/// Drivers map their native errors onto these kinds; only `Connection` and
/// `Busy` are considered transient.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DbError {
    /// The connection could not be established or was lost.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The database is locked or overloaded (`SQLITE_BUSY`, D1 overload...).
    #[error("Database busy: {0}")]
    Busy(String),

    /// The statement was rejected (syntax, unknown table or column).
    #[error("SQL error: {0}")]
    Sql(String),

    /// A constraint (unique, foreign key, not null) was violated.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: usize, last: Box<DbError> },

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl DbError {
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::Connection(_) | DbError::Busy(_))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => {
                let message = db.message().to_string();
                match db.kind() {
                    ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation => DbError::Constraint(message),
                    // SQLITE_BUSY and SQLITE_LOCKED carry no dedicated kind.
                    _ if message.contains("locked") || message.contains("busy") => {
                        DbError::Busy(message)
                    }
                    _ => DbError::Sql(message),
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => DbError::Connection(err.to_string()),
            other => DbError::Unknown(other.to_string()),
        }
    }
}

/// A driver failure together with the statement that caused it.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Failed to execute `{sql}` with {} argument(s): {source}", args.len())]
pub struct ExecutionError {
    pub sql: String,
    pub args: Vec<Value>,
    #[source]
    pub source: DbError,
}

impl ExecutionError {
    pub fn new(sql: &str, args: &[Value], source: DbError) -> Self {
        Self {
            sql: sql.to_string(),
            args: args.to_vec(),
            source,
        }
    }
}
