//! Error types for the database layer.

use kamero_license::LicenseError;
use thiserror::Error;

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors that can occur in database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLite.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The singleton license row is gone.
    #[error("license row {0} is missing")]
    MissingRecord(String),

    /// A stored value could not be interpreted.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Another thread panicked while holding the connection.
    #[error("connection lock poisoned")]
    Poisoned,
}

impl From<DbError> for LicenseError {
    fn from(err: DbError) -> Self {
        LicenseError::Storage(err.to_string())
    }
}
