//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Write-back flush: reconciles overflowed cache entries with the durable store

mod flush;

pub use flush::{spawn_flush_task, FlushHandle};
