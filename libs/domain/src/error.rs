//! Error taxonomy shared by every domain operation

use common::error::DatabaseError;
use thiserror::Error;

use crate::permissions::Action;

/// Custom error type for domain operations
#[derive(Error, Debug)]
pub enum DomainError {
    /// Referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The permission model denied a module action
    #[error("Permission denied: {action} on {module}")]
    PermissionDenied { module: String, action: Action },

    /// A role or ownership rule denied the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The operation would break a state invariant
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Input failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage failure
    #[error(transparent)]
    Database(DatabaseError),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<DatabaseError> for DomainError {
    fn from(err: DatabaseError) -> Self {
        // Unique violations surface as validation errors, never as raw store errors.
        match err.unique_violation() {
            Some(constraint) => {
                DomainError::Validation(format!("duplicate value violates {}", constraint))
            }
            None => DomainError::Database(err),
        }
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DatabaseError::from(err).into()
    }
}

/// Type alias for Result with DomainError
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DomainError::not_found("horse", "42");
        assert_eq!(err.to_string(), "horse not found: 42");
    }

    #[test]
    fn test_row_not_found_stays_database_error() {
        let err: DomainError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DomainError::Database(_)));
    }

    #[test]
    fn test_permission_denied_names_module_and_action() {
        let err = DomainError::PermissionDenied {
            module: "payments".to_string(),
            action: Action::Delete,
        };
        assert_eq!(err.to_string(), "Permission denied: delete on payments");
    }
}
