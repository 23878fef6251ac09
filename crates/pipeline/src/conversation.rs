//! One conversation turn, end to end.

use std::sync::Arc;

use imgedit_core::conversation::{
    ContinueSession, ConversationResponse, ImagePayload, SessionRequest,
};
use imgedit_core::engine::{ConversationEngine, EngineOutput, EngineRequest};
use imgedit_core::error::CoreError;
use imgedit_core::gem::Gem;
use imgedit_core::model::Model;
use imgedit_core::session::SessionData;
use imgedit_core::types::generate_id;
use imgedit_core::validation::{validate_image_urls, validate_prompt};
use imgedit_store::SessionStore;

use crate::images::ImagePipeline;

/// Starts and continues conversations against the engine.
///
/// A turn is: fetch inputs, call the engine, drop the scratch files, persist
/// produced images, assign public URLs.
pub struct ConversationService {
    engine: Arc<dyn ConversationEngine>,
    sessions: Arc<SessionStore>,
    images: ImagePipeline,
}

struct TurnOutput {
    text: String,
    metadata: Vec<Option<String>>,
    images: Vec<ImagePayload>,
    thoughts: Option<String>,
}

impl ConversationService {
    pub fn new(
        engine: Arc<dyn ConversationEngine>,
        sessions: Arc<SessionStore>,
        images: ImagePipeline,
    ) -> Self {
        Self {
            engine,
            sessions,
            images,
        }
    }

    /// Run the first turn of a new conversation and register the session.
    pub async fn start_session(
        &self,
        request: SessionRequest,
    ) -> Result<ConversationResponse, CoreError> {
        validate_prompt(&request.prompt)?;
        validate_image_urls(&request.image_urls)?;

        let turn = self
            .run_turn(
                &request.prompt,
                &request.image_urls,
                request.model,
                request.gem.clone(),
                None,
            )
            .await?;

        let session_id = generate_id();
        self.sessions
            .create(
                &session_id,
                SessionData::new(turn.metadata.clone(), request.model, request.gem),
            )
            .await;
        tracing::info!(%session_id, model = %request.model, images = turn.images.len(), "Session started");

        Ok(turn.into_response(session_id))
    }

    /// Run a follow-up turn with the stored model, gem and metadata.
    pub async fn continue_session(
        &self,
        session_id: &str,
        input: ContinueSession,
    ) -> Result<ConversationResponse, CoreError> {
        validate_prompt(&input.prompt)?;
        validate_image_urls(&input.image_urls)?;
        let session = self.sessions.get(session_id).await?;

        let turn = self
            .run_turn(
                &input.prompt,
                &input.image_urls,
                session.model,
                session.gem,
                Some(session.metadata),
            )
            .await?;

        self.sessions
            .update_metadata(session_id, turn.metadata.clone())
            .await?;
        tracing::info!(%session_id, images = turn.images.len(), "Session continued");

        Ok(turn.into_response(session_id.to_string()))
    }

    async fn run_turn(
        &self,
        prompt: &str,
        image_urls: &[String],
        model: Model,
        gem: Gem,
        metadata: Option<Vec<Option<String>>>,
    ) -> Result<TurnOutput, CoreError> {
        let scratch = self.images.fetch_inputs(image_urls).await?;

        let output = self
            .engine
            .send(EngineRequest {
                prompt: prompt.to_string(),
                files: scratch.files().to_vec(),
                model,
                gem,
                metadata,
            })
            .await;
        // Inputs are no longer needed once the engine has answered.
        drop(scratch);
        let EngineOutput {
            text,
            metadata,
            images,
            thoughts,
        } = output?;

        let mut payloads = self.images.persist_outputs(&images).await?;
        self.images.assign_urls(&mut payloads).await;

        Ok(TurnOutput {
            text,
            metadata,
            images: payloads,
            thoughts,
        })
    }
}

impl TurnOutput {
    fn into_response(self, session_id: String) -> ConversationResponse {
        ConversationResponse {
            session_id,
            text: self.text,
            metadata: self.metadata,
            images: self.images,
            thoughts: self.thoughts,
        }
    }
}
