//! Error types shared across the API.
//!
//! Every failure maps onto the same JSON envelope the success path uses,
//! so clients can branch on the `success` flag alone. Validation problems
//! enumerate every offending field in one response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::media::UploadError;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or missing client input. Detected before any storage or
    /// media-host call is made.
    #[error("validation failed: {0:?}")]
    Validation(Vec<String>),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid or missing authorization")]
    Unauthorized,

    /// The external image host rejected the payload or timed out.
    #[error("image upload failed: {0}")]
    Upload(#[from] UploadError),

    /// The persistence layer is not reachable or a round trip failed.
    #[error("storage unavailable: {0}")]
    Store(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Single-field validation failure.
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::Validation(vec![message.into()])
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Upload(UploadError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Upload(_) => StatusCode::BAD_GATEWAY,
            ApiError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = match &self {
            ApiError::Validation(errors) => json!({
                "success": false,
                "message": "Validation failed",
                "errors": errors,
            }),
            ApiError::NotFound(what) => json!({
                "success": false,
                "message": format!("{what} not found"),
            }),
            ApiError::Unauthorized => json!({
                "success": false,
                "message": "Invalid or missing authorization",
            }),
            ApiError::Upload(err) => json!({
                "success": false,
                "message": "Image upload failed",
                "error": err.to_string(),
            }),
            ApiError::Store(detail) => json!({
                "success": false,
                "message": "Storage unavailable",
                "error": detail,
            }),
            ApiError::Internal(detail) => {
                // Full detail only leaves the process in development mode.
                if development_mode() {
                    json!({ "success": false, "message": "Internal server error", "error": detail })
                } else {
                    json!({ "success": false, "message": "Internal server error" })
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

fn development_mode() -> bool {
    std::env::var("APP_ENV").map(|v| v != "production").unwrap_or(true)
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

macro_rules! store_error {
    ($($err:ty),+ $(,)?) => {$(
        impl From<$err> for ApiError {
            fn from(err: $err) -> Self {
                ApiError::Store(err.to_string())
            }
        }
    )+};
}

store_error!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);
