//! Process-local key-value store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::store::kv::{KeyValueStore, StoreError, StoreResult};

/// In-memory store backed by a concurrent map.
///
/// Clones share the same map, so several service instances inside one
/// process (tests, local demos) see one task list.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, String>>,
    available: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulate an outage: while unavailable every call fails.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    fn check(&self) -> StoreResult<()> {
        if self.available.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.check()?;
        Ok(self.inner.get(key).map(|r| r.value().clone()))
    }

    async fn set(&self, key: &str, value: String) -> StoreResult<()> {
        self.check()?;
        self.inner.insert(key.to_string(), value);
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set() {
        let store = MemoryStore::new();
        assert!(store.get("todos").await.unwrap().is_none());

        store.set("todos", "[]".into()).await.unwrap();
        assert_eq!(store.get("todos").await.unwrap().as_deref(), Some("[]"));

        // Clones share state
        let other = store.clone();
        other.set("todos", "[1]".into()).await.unwrap();
        assert_eq!(store.get("todos").await.unwrap().as_deref(), Some("[1]"));
    }

    #[tokio::test]
    async fn test_outage() {
        let store = MemoryStore::new();
        store.set_available(false);
        assert!(matches!(store.ping().await, Err(StoreError::Unavailable(_))));
        assert!(store.get("todos").await.is_err());

        store.set_available(true);
        assert!(store.ping().await.is_ok());
    }
}
