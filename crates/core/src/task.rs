//! Asynchronous task records and their status state machine.
//!
//! ```text
//! pending ──> processing ──> completed
//!    │             │
//!    └─────────────┴───────> failed
//! ```
//!
//! `completed` and `failed` are terminal; nothing leaves them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::conversation::{ConversationResponse, SessionRequest};
use crate::types::{TaskId, Timestamp};

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether no further transition is allowed.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Transition table. Self-edges are not listed here; the store treats
    /// re-applying a terminal status as a no-op and rejects the others.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Processing) | (Pending, Failed) | (Processing, Completed) | (Processing, Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored state of a task, keyed by id in the task store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskData {
    pub status: TaskStatus,
    /// Snapshot of the originating request; never mutated.
    pub request: SessionRequest,
    pub webhook_url: String,
    /// Present iff `status` is `completed`.
    pub result: Option<ConversationResponse>,
    /// Present iff `status` is `failed`.
    pub error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TaskData {
    /// A new `pending` task.
    pub fn pending(request: SessionRequest, webhook_url: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            status: TaskStatus::Pending,
            request,
            webhook_url: webhook_url.into(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A task together with its id, as returned from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(flatten)]
    pub data: TaskData,
}

/// Body POSTed to a task's webhook once it reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNotification {
    pub task_id: TaskId,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ConversationResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskNotification {
    pub fn completed(task_id: impl Into<TaskId>, result: ConversationResponse) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Completed,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(task_id: impl Into<TaskId>, error: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Failed,
            result: None,
            error: Some(error.into()),
        }
    }
}
