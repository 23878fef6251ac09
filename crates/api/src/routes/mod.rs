pub mod health;
pub mod sessions;
pub mod tasks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /sessions                     start a conversation (POST)
/// /sessions/{id}/messages       continue a conversation (POST)
///
/// /tasks                        submit a background task (POST)
/// /tasks/{id}                   task status (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/sessions", sessions::router())
        .nest("/tasks", tasks::router())
}
