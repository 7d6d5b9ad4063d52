//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP responses.
//! All errors implement `IntoResponse` to provide consistent error formatting.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
///
/// Missing records are not represented here: an absent recipe on edit
/// redirects and an absent recipe on delete is a no-op.
#[derive(Error, Debug)]
pub enum AppError {
    /// A query or write against the document store failed
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),

    /// Creating the upload directory or writing the uploaded file failed
    #[error("Upload failed: {0}")]
    Upload(#[from] std::io::Error),

    /// The uploaded file name had nothing usable left after sanitizing
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    /// The submitted form could not be parsed
    #[error("Invalid form: {0}")]
    InvalidForm(String),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidFilename(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidForm(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
