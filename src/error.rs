//! Error types for the cache node
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache node.
///
/// Cloneable so that the outcome of one coalesced load can be handed to
/// every caller that waited on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Empty key, empty group name or otherwise malformed input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The origin confirmed the key does not exist
    #[error("Key not found: {0}")]
    NotFound(String),

    /// No group registered under this name
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    /// The origin failed for a reason other than a missing key
    #[error("Origin error: {0}")]
    Origin(String),

    /// Transfer from a remote peer failed
    #[error("Remote fetch failed: {0}")]
    RemoteFetch(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Returns true when the origin reported the key as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::NotFound(_) | CacheError::GroupNotFound(_) => StatusCode::NOT_FOUND,
            CacheError::RemoteFetch(_) => StatusCode::BAD_GATEWAY,
            CacheError::Origin(_) | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache node.
pub type Result<T> = std::result::Result<T, CacheError>;
