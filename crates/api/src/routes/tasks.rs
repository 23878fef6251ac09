//! Route definitions for the `/tasks` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// POST /        -> submit_task
/// GET  /{id}    -> get_task
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(tasks::submit_task))
        .route("/{id}", get(tasks::get_task))
}
