//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    add_generated_handler, add_handler, clear_handler, fetch_handler, health_handler,
    remove_all_handler, remove_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /cache` - Store the body under a generated key
/// - `POST /cache/:key` - Store the body under `key`
/// - `GET /cache/:key` - Fetch a record
/// - `DELETE /cache/:key` - Remove a record
/// - `DELETE /admin/cache/clear` - Empty the cache only
/// - `DELETE /admin/cache/remove/all` - Empty the cache and the durable store
/// - `GET /stats` - Engine statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cache", post(add_generated_handler))
        .route(
            "/cache/:key",
            post(add_handler).get(fetch_handler).delete(remove_handler),
        )
        .route("/admin/cache/clear", delete(clear_handler))
        .route("/admin/cache/remove/all", delete(remove_all_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
