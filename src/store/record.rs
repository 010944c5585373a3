//! Durable Record Module
//!
//! Row shape owned by the durable store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Durable Record ==
/// A persisted record. Timestamps are maintained by the store, never by the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurableRecord {
    /// Record key
    pub id: String,
    /// Opaque stored value
    pub value: String,
    /// Time of the first write, fixed afterwards
    pub created_at: DateTime<Utc>,
    /// Time of the latest write
    pub updated_at: DateTime<Utc>,
}

impl DurableRecord {
    // == Constructor ==
    /// Creates a record stamped with the current time.
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            value: value.into(),
            created_at: now,
            updated_at: now,
        }
    }

    // == Upsert ==
    /// Replaces the value, keeping `created_at` and refreshing `updated_at`.
    pub fn update(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.updated_at = Utc::now();
    }
}

/// Upserts `value` under `id` in a table keyed by id.
pub(crate) fn upsert(
    table: &mut std::collections::HashMap<String, DurableRecord>,
    id: &str,
    value: &str,
) {
    match table.get_mut(id) {
        Some(record) => record.update(value),
        None => {
            table.insert(id.to_string(), DurableRecord::new(id, value));
        }
    }
}
