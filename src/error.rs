//! Error types for Radiopool server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error codes exposed to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    DbTimeout = 4,
    NoSuchRecord = 5,
    Duplicate = 6,
    BadValue = 7,
}

/// Main application error type
///
/// Store failures are classified once, in `From<sqlx::Error>`; errors that
/// are already one of these kinds pass through transaction scopes unchanged.
#[derive(Error, Debug)]
pub enum AppError {
    /// No session, invalid session or failed credential check. One variant,
    /// one message, whichever check failed.
    #[error("Invalid credentials or session")]
    Unauthorized,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Store transaction exceeded its deadline
    #[error("Storage operation timed out")]
    Timeout,

    /// Catch-all for store/session failures. The payload is logged, never
    /// returned to the caller.
    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Value already in use".to_string())
            }
            _ => AppError::OperationFailed(err.to_string()),
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorCode::NotAuthorized,
                self.to_string(),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchRecord, msg.clone()),
            AppError::Timeout => {
                tracing::error!("Store transaction exceeded its deadline");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    ErrorCode::DbTimeout,
                    "Storage operation timed out".to_string(),
                )
            }
            AppError::OperationFailed(detail) => {
                tracing::error!("Operation failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Operation failed".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
