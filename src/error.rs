//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::models::ApiResponse;
use crate::store::StoreError;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine and its transport.
#[derive(Error, Debug)]
pub enum CacheError {
    /// An operation was invoked before `initialize()` completed
    #[error("Cache engine not initialized")]
    NotInitialized,

    /// Key is in neither the cache nor the durable store
    #[error("Record not found for key: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The durable store failed
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    // == Display Messages ==
    /// Human-readable messages carried into the error envelope.
    pub fn messages(&self) -> Vec<String> {
        vec![self.to_string()]
    }

    /// HTTP status the transport maps this error to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::NotInitialized => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Store(_) | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ApiResponse::<()>::error(self.messages()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
