//! Custom error types for the common library
//!
//! This module defines the database error type shared by every crate that
//! talks to PostgreSQL.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// PostgreSQL SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// A stored value could not be mapped back to its domain type
    #[error("Database decode error: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// Name of the violated unique constraint, if this is a unique violation
    pub fn unique_violation(&self) -> Option<String> {
        match self {
            DatabaseError::Query(SqlxError::Database(db_err))
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                Some(db_err.constraint().unwrap_or("unique").to_string())
            }
            _ => None,
        }
    }
}

impl From<SqlxError> for DatabaseError {
    fn from(err: SqlxError) -> Self {
        DatabaseError::Query(err)
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_unique_violations() {
        let err = DatabaseError::Query(SqlxError::RowNotFound);
        assert_eq!(err.unique_violation(), None);

        let err = DatabaseError::Decode("bad role".to_string());
        assert_eq!(err.unique_violation(), None);
    }
}
