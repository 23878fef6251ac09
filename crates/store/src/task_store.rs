use std::collections::HashMap;

use imgedit_core::conversation::ConversationResponse;
use imgedit_core::error::CoreError;
use imgedit_core::task::{Task, TaskData, TaskStatus};
use tokio::sync::Mutex;

const ENTITY: &str = "Task";

/// Registry of asynchronous task state, keyed by task id.
///
/// Enforces the [`TaskStatus`] transition table: a task can only move
/// forward, and a terminal status is never replaced by another status.
pub struct TaskStore {
    tasks: Mutex<HashMap<String, TaskData>>,
}

impl TaskStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new task. Ids are never reused, so an existing id is a
    /// [`CoreError::Conflict`].
    pub async fn create(&self, id: &str, data: TaskData) -> Result<(), CoreError> {
        let mut tasks = self.tasks.lock().await;
        if tasks.contains_key(id) {
            return Err(CoreError::Conflict(format!("Task {id} already exists")));
        }
        tracing::debug!(task_id = %id, status = %data.status, "Task registered");
        tasks.insert(id.to_string(), data);
        Ok(())
    }

    /// Return a copy of the task.
    pub async fn get(&self, id: &str) -> Result<Task, CoreError> {
        let tasks = self.tasks.lock().await;
        let data = tasks
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(ENTITY, id))?;
        Ok(Task {
            id: id.to_string(),
            data,
        })
    }

    /// Move a task to `status`, storing `result` (for `completed`) or
    /// `error` (for `failed`) alongside it and bumping `updated_at`.
    ///
    /// Re-applying the current status is a no-op. Edges outside the
    /// transition table are rejected with [`CoreError::Conflict`]; a payload
    /// that does not match the status is [`CoreError::InvalidInput`].
    pub async fn update_status(
        &self,
        id: &str,
        status: TaskStatus,
        result: Option<ConversationResponse>,
        error: Option<String>,
    ) -> Result<(), CoreError> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found(ENTITY, id))?;

        check_payload(status, result.is_some(), error.is_some())?;

        if task.status == status && status.is_terminal() {
            return Ok(());
        }
        if !task.status.can_transition_to(status) {
            tracing::warn!(
                task_id = %id,
                from = %task.status,
                to = %status,
                "Rejected task status transition",
            );
            return Err(CoreError::Conflict(format!(
                "Task {id} cannot move from {} to {status}",
                task.status
            )));
        }

        task.status = status;
        task.result = result;
        task.error = error;
        task.updated_at = chrono::Utc::now();
        Ok(())
    }

    /// Number of stored tasks.
    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.lock().await.is_empty()
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

/// `result` is present iff completed, `error` iff failed.
fn check_payload(status: TaskStatus, has_result: bool, has_error: bool) -> Result<(), CoreError> {
    let expected = (
        status == TaskStatus::Completed,
        status == TaskStatus::Failed,
    );
    if (has_result, has_error) != expected {
        return Err(CoreError::InvalidInput(format!(
            "Status {status} requires result={} and error={}",
            expected.0, expected.1
        )));
    }
    Ok(())
}
