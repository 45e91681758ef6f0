//! Error types for the restore service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Service error types.
///
/// Store and validation failures never get here: the handlers render them as
/// alerts. Anything that reaches [`IntoResponse`] is a plain-text response.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Url path not found: {0}")]
    RouteNotFound(String),

    #[error("Failed to read request body: {0}")]
    Body(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
}

/// Template loading failures.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to read template {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Body(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Server-side failures are logged in full but not echoed to the client
        let body = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, body).into_response()
    }
}
