//! Durable Store Module
//!
//! The key -> record table that evicted cache entries overflow into.

mod json_file;
mod memory;
mod record;
mod traits;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use record::DurableRecord;
pub use traits::{DurableStore, StoreError, StoreResult};
