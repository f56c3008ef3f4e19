//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::DomainError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing, malformed or rejected credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Failure reported by a domain operation
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Domain(err) => match err {
                DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
                DomainError::PermissionDenied { .. } | DomainError::Forbidden(_) => {
                    StatusCode::FORBIDDEN
                }
                DomainError::Conflict(_) => StatusCode::CONFLICT,
                DomainError::Validation(_) => StatusCode::BAD_REQUEST,
                DomainError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Domain(DomainError::Database(e)) => {
                error!("Database error: {}", e);
                "Database error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use common::error::DatabaseError;
    use domain::permissions::Action;

    fn status_of(err: DomainError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        assert_eq!(
            status_of(DomainError::not_found("horse", "42")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainError::PermissionDenied {
                module: "horses".to_string(),
                action: Action::Edit,
            }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(DomainError::Forbidden("nope".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(DomainError::Conflict("last super admin".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::Validation("bad email".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::Database(DatabaseError::Configuration(
                "boom".to_string()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_api_errors_map_to_status_codes() {
        assert_eq!(
            ApiError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::BadRequest("year".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InternalServerError.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_message_keeps_domain_detail() {
        let err = ApiError::from(DomainError::Validation("invalid email format".to_string()));
        assert_eq!(err.to_string(), "Validation error: invalid email format");
    }
}
