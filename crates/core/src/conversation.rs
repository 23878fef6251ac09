//! Request and response shapes of a conversation turn.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::gem::Gem;
use crate::model::Model;
use crate::types::SessionId;
use crate::validation::{validate_image_urls, validate_prompt};

/// Caller input that starts a new conversation, as received on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartSession {
    pub prompt: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub model: Option<String>,
    pub gem: Option<String>,
}

/// Caller input for a follow-up turn in an existing conversation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContinueSession {
    pub prompt: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

/// A validated request with the model and gem resolved.
///
/// Also the immutable request snapshot stored on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub prompt: String,
    pub image_urls: Vec<String>,
    pub model: Model,
    pub gem: Gem,
}

impl TryFrom<StartSession> for SessionRequest {
    type Error = CoreError;

    fn try_from(input: StartSession) -> Result<Self, Self::Error> {
        validate_prompt(&input.prompt)?;
        validate_image_urls(&input.image_urls)?;
        let model = Model::resolve(input.model.as_deref())?;
        Ok(Self {
            prompt: input.prompt,
            image_urls: input.image_urls,
            model,
            gem: Gem::from(input.gem),
        })
    }
}

/// One image of a turn's output, persisted and ready for transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub title: String,
    pub alt: String,
    pub mime_type: String,
    /// Base64 (standard alphabet, padded) image bytes.
    pub data: String,
    /// Absolute path of the stored file.
    pub path: String,
    /// Public locator; filled in after persistence.
    pub url: Option<String>,
}

/// Result of a conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub session_id: SessionId,
    pub text: String,
    pub metadata: Vec<Option<String>>,
    pub images: Vec<ImagePayload>,
    pub thoughts: Option<String>,
}
