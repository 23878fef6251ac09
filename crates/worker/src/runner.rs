//! Bounded task queue and worker pool.
//!
//! Submission reserves a queue slot before the task is registered, so a
//! full queue rejects the request without leaving a stray `pending` task.
//! Dropping the [`TaskRunner`] closes the queue: workers finish what is
//! already queued and then exit.

use std::sync::Arc;

use imgedit_core::conversation::SessionRequest;
use imgedit_core::error::CoreError;
use imgedit_core::task::{Task, TaskData, TaskNotification, TaskStatus};
use imgedit_core::types::{generate_id, TaskId};
use imgedit_core::validation::{validate_http_url, validate_image_urls, validate_prompt};
use imgedit_events::delivery::webhook::DEFAULT_MAX_ATTEMPTS;
use imgedit_events::WebhookNotifier;
use imgedit_pipeline::ConversationService;
use imgedit_store::TaskStore;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::outcome::{failure_message, GENERIC_FAILURE};

/// Default number of worker loops.
pub const DEFAULT_WORKERS: usize = 4;

/// Default number of queued, not yet running, tasks.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Pool sizing and delivery policy.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Worker loops; at least one is always started.
    pub workers: usize,
    /// Queue slots; at least one.
    pub queue_capacity: usize,
    /// Webhook attempts per finished task.
    pub webhook_max_attempts: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            webhook_max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Collaborators a task needs to run.
#[derive(Clone)]
pub struct RunnerDeps {
    pub tasks: Arc<TaskStore>,
    pub conversation: Arc<ConversationService>,
    pub notifier: Arc<WebhookNotifier>,
}

/// State shared by the runner handle and every worker loop.
struct Shared {
    deps: RunnerDeps,
    webhook_max_attempts: u32,
}

/// Accepts tasks and hands them to the worker pool.
pub struct TaskRunner {
    queue: mpsc::Sender<TaskId>,
    shared: Arc<Shared>,
}

impl TaskRunner {
    /// Spawn the worker pool. The returned handles finish once the runner
    /// is dropped and the queue has drained.
    pub fn start(config: RunnerConfig, deps: RunnerDeps) -> (Self, Vec<JoinHandle<()>>) {
        let workers = config.workers.max(1);
        let capacity = config.queue_capacity.max(1);

        let (tx, rx) = mpsc::channel(capacity);
        let rx = Arc::new(Mutex::new(rx));
        let shared = Arc::new(Shared {
            deps,
            webhook_max_attempts: config.webhook_max_attempts,
        });

        let handles = (0..workers)
            .map(|worker| tokio::spawn(worker_loop(worker, Arc::clone(&rx), Arc::clone(&shared))))
            .collect();

        tracing::info!(workers, queue_capacity = capacity, "Task runner started");
        (Self { queue: tx, shared }, handles)
    }

    /// Register a `pending` task for `request` and queue it.
    ///
    /// Returns the task as stored. Fails with [`CoreError::InvalidInput`] on
    /// a malformed request and [`CoreError::Overloaded`] when the queue is
    /// full; in both cases no task is created.
    pub async fn submit(
        &self,
        request: SessionRequest,
        webhook_url: String,
    ) -> Result<Task, CoreError> {
        validate_prompt(&request.prompt)?;
        validate_image_urls(&request.image_urls)?;
        validate_http_url("webhook_url", &webhook_url)?;

        let permit = self.queue.try_reserve().map_err(|e| match e {
            TrySendError::Full(()) => CoreError::Overloaded("Task queue is full".to_string()),
            TrySendError::Closed(()) => {
                CoreError::Overloaded("Task runner is shutting down".to_string())
            }
        })?;

        let task_id = generate_id();
        let tasks = &self.shared.deps.tasks;
        tasks
            .create(&task_id, TaskData::pending(request, webhook_url))
            .await?;
        let task = tasks.get(&task_id).await?;

        permit.send(task_id.clone());
        tracing::info!(%task_id, "Task queued");
        Ok(task)
    }

    /// Current state of a task.
    pub async fn get(&self, task_id: &str) -> Result<Task, CoreError> {
        self.shared.deps.tasks.get(task_id).await
    }

    /// Run one task to completion on the calling task, bypassing the queue.
    pub async fn run_task(&self, task_id: &str) {
        self.shared.run_task(task_id).await;
    }
}

async fn worker_loop(worker: usize, queue: Arc<Mutex<mpsc::Receiver<TaskId>>>, shared: Arc<Shared>) {
    tracing::debug!(worker, "Task worker started");
    loop {
        let next = queue.lock().await.recv().await;
        let Some(task_id) = next else {
            break;
        };
        shared.run_task(&task_id).await;
    }
    tracing::debug!(worker, "Task worker stopped");
}

impl Shared {
    /// Drive `task_id` from `pending` to a terminal status and notify its
    /// webhook once.
    async fn run_task(&self, task_id: &str) {
        let tasks = &self.deps.tasks;

        let task = match tasks.get(task_id).await {
            Ok(task) => task,
            Err(e) => {
                tracing::warn!(%task_id, error = %e, "Queued task vanished");
                return;
            }
        };
        if let Err(e) = tasks
            .update_status(task_id, TaskStatus::Processing, None, None)
            .await
        {
            tracing::warn!(%task_id, error = %e, "Task is not runnable");
            return;
        }
        tracing::info!(%task_id, model = %task.data.request.model, "Task processing");

        // A panic in the turn stays inside this JoinHandle.
        let conversation = Arc::clone(&self.deps.conversation);
        let request = task.data.request;
        let outcome = tokio::spawn(async move { conversation.start_session(request).await }).await;

        let notification = match outcome {
            Ok(Ok(response)) => TaskNotification::completed(task_id, response),
            Ok(Err(err)) => {
                tracing::warn!(%task_id, error = %err, "Task failed");
                TaskNotification::failed(task_id, failure_message(&err))
            }
            Err(join_err) => {
                tracing::error!(%task_id, error = %join_err, "Task aborted");
                TaskNotification::failed(task_id, GENERIC_FAILURE)
            }
        };

        if let Err(e) = tasks
            .update_status(
                task_id,
                notification.status,
                notification.result.clone(),
                notification.error.clone(),
            )
            .await
        {
            tracing::error!(%task_id, error = %e, "Failed to record task outcome");
        }

        let delivered = self
            .deps
            .notifier
            .notify(&task.data.webhook_url, &notification, self.webhook_max_attempts)
            .await;
        tracing::info!(%task_id, status = %notification.status, delivered, "Task finished");
    }
}
