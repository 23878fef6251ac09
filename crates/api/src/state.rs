use std::sync::Arc;

use imgedit_pipeline::ConversationService;
use imgedit_worker::TaskRunner;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone. The task queue closes once the last clone (and with it
/// the last `TaskRunner` reference) is dropped.
#[derive(Clone)]
pub struct AppState {
    /// Synchronous conversation turns.
    pub conversation: Arc<ConversationService>,
    /// Background task submission and lookup.
    pub runner: Arc<TaskRunner>,
}
