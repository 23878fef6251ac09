//! Handlers for background conversation tasks.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use imgedit_core::conversation::{SessionRequest, StartSession};
use imgedit_core::task::Task;
use imgedit_core::types::TaskId;
use serde::Deserialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /tasks`: a session start plus where to report the outcome.
#[derive(Debug, Deserialize)]
pub struct SubmitTask {
    #[serde(flatten)]
    pub session: StartSession,
    pub webhook_url: String,
}

/// POST /api/v1/tasks
///
/// Queue a session start for background execution. Returns the `pending`
/// task immediately; the outcome is POSTed to `webhook_url`. Returns 503
/// when the queue is full.
pub async fn submit_task(
    State(state): State<AppState>,
    payload: Result<Json<SubmitTask>, JsonRejection>,
) -> AppResult<(StatusCode, Json<DataResponse<Task>>)> {
    let Json(input) = payload?;
    let request = SessionRequest::try_from(input.session)?;

    let task = state.runner.submit(request, input.webhook_url).await?;
    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: task })))
}

/// GET /api/v1/tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<TaskId>,
) -> AppResult<Json<DataResponse<Task>>> {
    let task = state.runner.get(&task_id).await?;
    Ok(Json(DataResponse { data: task }))
}
