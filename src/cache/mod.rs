//! Cache Module
//!
//! The bounded, recency-ordered in-memory side of the engine.

mod lru;
mod record;
mod stats;


// Re-export public types
pub use lru::BoundedLru;
pub use record::CacheRecord;
pub use stats::CacheStats;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
