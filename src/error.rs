//! Error types for the cache service
//!
//! Provides unified error handling using thiserror. Errors are raised by the
//! backend layer and absorbed by `CacheService`; only `InvalidRequest` ever
//! reaches an HTTP client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache service.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The distributed backend rejected or failed a command
    #[error("Backend error: {0}")]
    Backend(String),

    /// The connection to the distributed backend is down or could not be opened
    #[error("Connection error: {0}")]
    Connection(String),

    /// A distributed backend command did not complete in time
    #[error("Operation timed out after {0} ms")]
    Timeout(u64),

    /// A value could not be converted to or from its stored form
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The active backend has no implementation of the operation
    #[error("Operation not supported by the in-process backend: {0}")]
    Unsupported(&'static str),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Returns true when the error means the connection itself is unusable,
    /// as opposed to a single failed command.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, CacheError::Connection(_))
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
            CacheError::Connection(err.to_string())
        } else {
            CacheError::Backend(err.to_string())
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
            CacheError::Connection(_) | CacheError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache service.
pub type Result<T> = std::result::Result<T, CacheError>;
