//! Storage subsystem.
//!
//! # Data Flow
//! ```text
//! TaskService
//!     → tasks.rs (TaskStore: whole-list load/save under one key)
//!     → kv.rs (KeyValueStore trait: get / set / ping)
//!         - memory.rs (process-local map)
//!         - upstash.rs (Upstash Redis REST)
//! ```
//!
//! # Design Decisions
//! - The store sees opaque strings only; task encoding stays in tasks.rs
//! - Backends are trait objects chosen from config at startup
//! - No locking or versioning around read-modify-write

pub mod kv;
pub mod memory;
pub mod tasks;
pub mod upstash;

use std::sync::Arc;

pub use kv::{KeyValueStore, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use tasks::TaskStore;
pub use upstash::UpstashStore;

use crate::config::{StoreBackend, StoreConfig};

/// Build the configured key-value store backend.
pub fn connect(config: &StoreConfig) -> StoreResult<Arc<dyn KeyValueStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; tasks are not shared between instances");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Upstash => {
            tracing::info!(store_url = %config.url, "Using Upstash REST store");
            Ok(Arc::new(UpstashStore::new(config)?))
        }
    }
}
