use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Error taxonomy for every core operation.
///
/// Handlers return `Result<HttpResponse, ApiError>` and propagate with `?`;
/// the `ResponseError` impl maps each variant to a status code and a JSON
/// body, so no handler builds error responses by hand.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or out-of-range input (400).
    #[error("{0}")]
    Validation(String),

    /// Duplicate unique-constrained entity (409).
    #[error("{0}")]
    Conflict(String),

    /// Actor lacks rights for the operation (403).
    #[error("{0}")]
    Authorization(String),

    /// Referenced entity absent (404).
    #[error("{0}")]
    NotFound(String),

    /// Bad credentials (401).
    #[error("{0}")]
    Authentication(String),

    /// Storage failure surfaced as 500.
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Translates a unique-constraint violation into a Conflict.
    ///
    /// Concurrent duplicate inserts race past the service-level existence
    /// checks; the store rejects the second writer and that rejection must
    /// become a 409, not a 500.
    pub fn conflict_on_unique(err: DbErr, message: &str) -> ApiError {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ApiError::Conflict(message.to_string())
            }
            _ => ApiError::Database(err),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Database(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation(msg) | ApiError::Conflict(msg) => {
                serde_json::json!({ "errors": msg })
            }
            _ => serde_json::json!({ "detail": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
