//! Handlers for synchronous conversation turns.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use imgedit_core::conversation::{
    ContinueSession, ConversationResponse, SessionRequest, StartSession,
};
use imgedit_core::types::SessionId;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/sessions
///
/// Run the first turn of a new conversation. Blocks until the engine has
/// answered and every produced image is stored.
pub async fn start_session(
    State(state): State<AppState>,
    payload: Result<Json<StartSession>, JsonRejection>,
) -> AppResult<(StatusCode, Json<DataResponse<ConversationResponse>>)> {
    let Json(input) = payload?;
    let request = SessionRequest::try_from(input)?;

    let response = state.conversation.start_session(request).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: response })))
}

/// POST /api/v1/sessions/{id}/messages
///
/// Run a follow-up turn in an existing conversation.
pub async fn continue_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    payload: Result<Json<ContinueSession>, JsonRejection>,
) -> AppResult<Json<DataResponse<ConversationResponse>>> {
    let Json(input) = payload?;

    let response = state
        .conversation
        .continue_session(&session_id, input)
        .await?;
    Ok(Json(DataResponse { data: response }))
}
