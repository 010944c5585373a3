//! Overflow Cache - a bounded LRU cache that overflows into a durable store
//!
//! Evicted entries are written back to the store instead of being dropped,
//! either inline with each operation or through a periodically flushed queue.

pub mod api;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use engine::{build_engine, CacheEngine, InlineEngine, Strategy, WriteBackEngine};
pub use error::{CacheError, Result};
pub use store::{DurableStore, JsonFileStore, MemoryStore};
