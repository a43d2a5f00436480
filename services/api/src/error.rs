//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, and how each
//! variant renders as an HTTP response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::error;

use crate::config::ConfigError;
use staff_dashboard_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database driver.
    #[error("Database Error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// Every API failure is rendered as `{"error": "..."}`. Expected conditions
/// keep their documented status codes; anything unexpected is logged here
/// and collapsed to a generic 500 so driver details never reach the client.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Port(err) => match err {
                PortError::Unauthorized => {
                    (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
                }
                PortError::NotFound(message) => (StatusCode::NOT_FOUND, message),
                PortError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
                PortError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
                PortError::Unavailable(message) => (StatusCode::SERVICE_UNAVAILABLE, message),
                PortError::Upstream { status, message } => (
                    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                    message,
                ),
                PortError::Unexpected(message) => {
                    error!("Unexpected port error: {message}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
            other => {
                error!("Internal error: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
