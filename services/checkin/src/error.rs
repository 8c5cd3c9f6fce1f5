//! Custom error types for the check-in service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the check-in service
///
/// Every variant maps to a recoverable HTTP response; bad input never
/// brings down the serving process.
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad form input, surfaced to the user as an inline message
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or invalid credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not an administrator
    #[error("Forbidden")]
    Forbidden,

    /// Missing entity
    #[error("Not found")]
    NotFound,

    /// Duplicate check-in for the same user and date
    #[error("Already checked in today")]
    AlreadyCheckedIn,

    /// Check-in attempted outside any active sign period
    #[error("No active sign period")]
    NoActivePeriod,

    /// Check-in attempted on a rest day
    #[error("Today is a rest day")]
    RestDay,

    /// Failed to persist submission content; no record row is kept
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Administrator access required".to_string(),
            ),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            AppError::AlreadyCheckedIn => (
                StatusCode::CONFLICT,
                "Already checked in today".to_string(),
            ),
            AppError::NoActivePeriod => (
                StatusCode::CONFLICT,
                "No active sign period today".to_string(),
            ),
            AppError::RestDay => (
                StatusCode::CONFLICT,
                "Today is a rest day, no check-in required".to_string(),
            ),
            AppError::Storage(e) => {
                tracing::error!("Storage failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to store submission".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for handler results
pub type AppResult<T> = Result<T, AppError>;

/// Whether a sqlx error is a unique-constraint violation
///
/// Repositories use this to turn a lost insert race into a domain error
/// instead of a 500.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (
                AppError::Validation("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden, StatusCode::FORBIDDEN),
            (AppError::NotFound, StatusCode::NOT_FOUND),
            (AppError::AlreadyCheckedIn, StatusCode::CONFLICT),
            (AppError::NoActivePeriod, StatusCode::CONFLICT),
            (AppError::RestDay, StatusCode::CONFLICT),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
