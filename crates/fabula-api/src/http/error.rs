//! Application error type mapping to HTTP status codes and envelope format.
//!
//! Errors travel to the client as `{"detail": "..."}` with one stable
//! string per failure, so the front-end can switch on the message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use fabula_types::error::StorageError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Unknown resource id.
    NotFound(&'static str),
    /// Request body failed validation.
    Validation(String),
    /// An upstream model call produced nothing usable.
    Upstream(&'static str),
    /// Document store failure.
    Storage(StorageError),
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Storage(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AppError::NotFound(detail) => (StatusCode::NOT_FOUND, detail.to_string()),
            AppError::Validation(detail) => (StatusCode::UNPROCESSABLE_ENTITY, detail),
            AppError::Upstream(detail) => (StatusCode::BAD_GATEWAY, detail.to_string()),
            AppError::Storage(err) => {
                tracing::error!(error = %err, "document store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error".to_string(),
                )
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
