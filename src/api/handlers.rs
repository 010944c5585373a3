//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint. They only translate
//! between HTTP and the [`CacheEngine`]; all cache semantics live there.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::CacheRecord;
use crate::engine::CacheEngine;
use crate::error::{CacheError, Result};
use crate::models::{validate_key, AddRequest, ApiResponse, HealthResponse, StatsResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The cache engine, whichever strategy it runs
    pub engine: Arc<dyn CacheEngine>,
}

impl AppState {
    /// Creates a new AppState around an engine.
    pub fn new(engine: Arc<dyn CacheEngine>) -> Self {
        Self { engine }
    }
}

async fn add(
    state: &AppState,
    key: Option<String>,
    value: String,
) -> Result<Json<ApiResponse<CacheRecord>>> {
    let req = AddRequest::new(key, value);
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let record = state.engine.add(req.key, req.value).await?;
    Ok(Json(ApiResponse::success(record)))
}

/// Handler for POST /cache
///
/// Stores the plain-text body under a generated key.
pub async fn add_generated_handler(
    State(state): State<AppState>,
    value: String,
) -> Result<Json<ApiResponse<CacheRecord>>> {
    add(&state, None, value).await
}

/// Handler for POST /cache/:key
///
/// Stores the plain-text body under `key`.
pub async fn add_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    value: String,
) -> Result<Json<ApiResponse<CacheRecord>>> {
    add(&state, Some(key), value).await
}

/// Handler for GET /cache/:key
pub async fn fetch_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<CacheRecord>>> {
    if let Some(error_msg) = validate_key(&key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }
    let record = state.engine.fetch(&key).await?;

    Ok(Json(ApiResponse::success(record)))
}

/// Handler for DELETE /cache/:key
pub async fn remove_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<String>>> {
    if let Some(error_msg) = validate_key(&key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }
    state.engine.remove(&key).await?;

    Ok(Json(ApiResponse::ok()))
}

/// Handler for DELETE /admin/cache/clear
///
/// Empties the in-memory cache; the durable store is untouched.
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<ApiResponse<String>>> {
    state.engine.clear().await?;
    Ok(Json(ApiResponse::ok()))
}

/// Handler for DELETE /admin/cache/remove/all
///
/// Empties both the cache and the durable store.
pub async fn remove_all_handler(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>> {
    state.engine.remove_all().await?;
    Ok(Json(ApiResponse::ok()))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<ApiResponse<StatsResponse>> {
    let stats = state.engine.stats().await;

    Json(ApiResponse::success(StatsResponse::new(
        state.engine.strategy(),
        state.engine.capacity(),
        stats,
    )))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
