//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `POST /cache[/:key]` - Store a value
//! - `GET /cache/:key` - Fetch a value
//! - `DELETE /cache/:key` - Remove a value
//! - `DELETE /admin/cache/clear` - Empty the cache
//! - `DELETE /admin/cache/remove/all` - Empty the cache and the store
//! - `GET /stats` - Engine statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
