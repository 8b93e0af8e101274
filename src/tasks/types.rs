//! Task types and error definitions.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// A single to-do entry.
///
/// Tasks only exist inside the stored list; there is no per-task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Time-derived identifier, unique within the list.
    pub id: String,
    /// Non-empty description.
    pub text: String,
    /// Completion flag, false on creation.
    pub completed: bool,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

/// Errors that can occur during task operations.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Input rejected before touching the store.
    #[error("{0}")]
    Validation(String),

    /// No task with the given id.
    #[error("task {0} not found")]
    NotFound(String),

    /// Store read or write failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for task operations.
pub type TaskResult<T> = Result<T, TaskError>;

/// Generates millisecond-derived task ids.
///
/// Two creations in the same millisecond would collide on a raw clock
/// reading, so every id is bumped past the last one handed out by this
/// process.
#[derive(Debug, Default)]
pub struct TaskIdGenerator {
    last: AtomicU64,
}

impl TaskIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id for a task created at `now`.
    pub fn next_id(&self, now: DateTime<Utc>) -> String {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = millis.max(prev + 1);
            match self.last.compare_exchange_weak(prev, candidate, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return candidate.to_string(),
                Err(actual) => prev = actual,
            }
        }
    }
}
