//! Task list adapter over the key-value store.
//!
//! The whole list lives under one key as a JSON array. Reads and writes
//! are whole-list; there is no compare-and-swap, so two writers that load
//! the same snapshot will overwrite each other.

use std::sync::Arc;

use serde_json::Value;

use crate::store::kv::{KeyValueStore, StoreResult};
use crate::tasks::Task;

/// Reads and writes the serialized task list.
#[derive(Clone)]
pub struct TaskStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl TaskStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self { kv, key: key.into() }
    }

    /// Load the current list. Absent and empty values are an empty list.
    pub async fn load(&self) -> StoreResult<Vec<Task>> {
        match self.kv.get(&self.key).await? {
            Some(raw) => decode_list(&raw),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the stored list.
    pub async fn save(&self, tasks: &[Task]) -> StoreResult<()> {
        let raw = serde_json::to_string(tasks)?;
        self.kv.set(&self.key, raw).await
    }

    /// Check store connectivity.
    pub async fn ping(&self) -> StoreResult<()> {
        self.kv.ping().await
    }
}

fn decode_list(raw: &str) -> StoreResult<Vec<Task>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(raw)? {
        Value::Null => Ok(Vec::new()),
        // Double-encoded: a JSON string holding the array.
        Value::String(inner) => decode_list(&inner),
        value => Ok(serde_json::from_value(value)?),
    }
}
