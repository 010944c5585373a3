//! Cache Record Module
//!
//! The key/value pair handed back to callers of the engine.

use serde::Serialize;

// == Cache Record ==
/// A cached key/value pair. Identity is the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheRecord {
    /// Record key
    pub key: String,
    /// Opaque stored value
    pub value: String,
}

impl CacheRecord {
    // == Constructor ==
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl From<crate::store::DurableRecord> for CacheRecord {
    fn from(record: crate::store::DurableRecord) -> Self {
        Self {
            key: record.id,
            value: record.value,
        }
    }
}
