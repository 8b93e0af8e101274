//! Key-value store abstraction.

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by store backends and the task list adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store could not be reached or rejected the command.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Store call did not complete in time.
    #[error("store call timed out after {0} ms")]
    Timeout(u64),

    /// Stored value could not be decoded.
    #[error("stored value is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A durable map of opaque string values.
///
/// The task service never addresses individual tasks at this layer; it
/// reads and writes one serialized blob per key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value under `key`, `None` when absent.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Replace the value under `key`.
    async fn set(&self, key: &str, value: String) -> StoreResult<()>;

    /// Round-trip to the store without touching data.
    async fn ping(&self) -> StoreResult<()>;
}
