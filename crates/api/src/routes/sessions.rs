//! Route definitions for the `/sessions` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::sessions;
use crate::state::AppState;

/// Routes mounted at `/sessions`.
///
/// ```text
/// POST /                 -> start_session
/// POST /{id}/messages    -> continue_session
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(sessions::start_session))
        .route("/{id}/messages", post(sessions::continue_session))
}
