//! Shutdown coordination.
//!
//! # Responsibilities
//! - Latch the stop request so late waiters still observe it
//! - Wake everything waiting when the first trigger fires
//!
//! # Design Decisions
//! - Cheap to clone: the signal listener, the server and the test
//!   harness each hold their own handle to one shared latch
//! - `wait` subscribes before reading the latch, so a trigger racing
//!   with a new waiter is never lost

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

/// Shared stop latch for one API instance.
#[derive(Clone)]
pub struct Shutdown {
    triggered: Arc<AtomicBool>,
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            triggered: Arc::new(AtomicBool::new(false)),
            tx,
        }
    }

    /// Request a stop. Returns `false` if one was already requested.
    pub fn trigger(&self) -> bool {
        if self.triggered.swap(true, Ordering::AcqRel) {
            return false;
        }
        tracing::info!(waiters = self.tx.receiver_count(), "Shutdown requested");
        let _ = self.tx.send(());
        true
    }

    /// Whether a stop has been requested.
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    /// Resolve once a stop has been requested, even if that happened
    /// before this call.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        if self.is_triggered() {
            return;
        }
        let _ = rx.recv().await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_clone_wakes_every_waiter() {
        let shutdown = Shutdown::new();
        let first = tokio::spawn({
            let shutdown = shutdown.clone();
            async move { shutdown.wait().await }
        });
        let second = tokio::spawn({
            let shutdown = shutdown.clone();
            async move { shutdown.wait().await }
        });
        tokio::task::yield_now().await;

        assert!(shutdown.clone().trigger());
        tokio::time::timeout(Duration::from_secs(1), async {
            first.await.unwrap();
            second.await.unwrap();
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_late_waiter_sees_earlier_trigger() {
        let shutdown = Shutdown::new();
        shutdown.trigger();

        assert!(shutdown.is_triggered());
        tokio::time::timeout(Duration::from_millis(100), shutdown.wait())
            .await
            .unwrap();
    }

    #[test]
    fn test_trigger_is_idempotent() {
        let shutdown = Shutdown::default();
        assert!(!shutdown.is_triggered());
        assert!(shutdown.trigger());
        assert!(!shutdown.trigger());
        assert!(shutdown.is_triggered());
    }
}
