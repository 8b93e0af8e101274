//! Task CRUD over the stored list.
//!
//! Every mutation fetches the list, changes it in memory and writes the
//! whole list back. Nothing serializes concurrent mutations: two requests
//! racing on the same list can silently drop one another's change.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;

use crate::store::TaskStore;
use crate::tasks::types::{Task, TaskError, TaskIdGenerator, TaskResult};

/// CRUD operations on the task list.
pub struct TaskService {
    store: TaskStore,
    ids: TaskIdGenerator,
    /// Last observed list length, read by the metrics scrape.
    current_count: AtomicUsize,
}

impl TaskService {
    pub fn new(store: TaskStore) -> Self {
        Self {
            store,
            ids: TaskIdGenerator::new(),
            current_count: AtomicUsize::new(0),
        }
    }

    /// Last list length this instance saw.
    pub fn cached_count(&self) -> usize {
        self.current_count.load(Ordering::Relaxed)
    }

    /// Refresh the cached count from the store.
    pub async fn warm_count(&self) -> TaskResult<usize> {
        let tasks = self.store.load().await?;
        self.current_count.store(tasks.len(), Ordering::Relaxed);
        Ok(tasks.len())
    }

    /// Ping the underlying store.
    pub async fn ping_store(&self) -> TaskResult<()> {
        Ok(self.store.ping().await?)
    }

    /// All tasks in creation order.
    pub async fn list_tasks(&self) -> TaskResult<Vec<Task>> {
        let tasks = self.store.load().await?;
        self.current_count.store(tasks.len(), Ordering::Relaxed);
        Ok(tasks)
    }

    /// Append a new task.
    pub async fn create_task(&self, text: Option<&str>) -> TaskResult<Task> {
        let text = match text {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => return Err(TaskError::Validation("task text is required".to_string())),
        };

        let mut tasks = self.store.load().await?;
        let now = Utc::now();
        let task = Task {
            id: self.ids.next_id(now),
            text,
            completed: false,
            created_at: now,
        };
        tasks.push(task.clone());
        self.store.save(&tasks).await?;

        self.current_count.store(tasks.len(), Ordering::Relaxed);
        tracing::info!(task_id = %task.id, text = %task.text, "Task created");
        Ok(task)
    }

    /// Set the completion flag of one task.
    pub async fn set_completion(&self, id: &str, completed: bool) -> TaskResult<Task> {
        let mut tasks = self.store.load().await?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        task.completed = completed;
        let updated = task.clone();
        self.store.save(&tasks).await?;

        tracing::info!(task_id = %id, completed, "Task updated");
        Ok(updated)
    }

    /// Remove one task and return it.
    pub async fn delete_task(&self, id: &str) -> TaskResult<Task> {
        let mut tasks = self.store.load().await?;
        let index = tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        let removed = tasks.remove(index);
        self.store.save(&tasks).await?;

        self.current_count.store(tasks.len(), Ordering::Relaxed);
        tracing::info!(task_id = %id, "Task deleted");
        Ok(removed)
    }
}
