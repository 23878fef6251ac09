//! Contract of the external conversation engine.
//!
//! The engine turns a prompt (plus optional local input images and a
//! continuation cursor) into text and a list of produced images. How it does
//! that is not this workspace's concern; [`ConversationEngine`] is the seam
//! where a real client or a test fake plugs in.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::gem::Gem;
use crate::model::Model;

/// Failure kinds the engine reports.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Usage limit exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Temporarily blocked: {0}")]
    TemporarilyBlocked(String),

    #[error("Engine timed out: {0}")]
    Timeout(String),

    #[error("Generation failed: {0}")]
    Generation(String),
}

/// Everything the engine needs for one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineRequest {
    pub prompt: String,
    /// Local paths of downloaded input images, in caller order.
    pub files: Vec<PathBuf>,
    pub model: Model,
    pub gem: Gem,
    /// Continuation cursor of a previous turn; `None` starts a new conversation.
    pub metadata: Option<Vec<Option<String>>>,
}

/// Where a produced image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    /// An image found on the web and quoted by the engine.
    #[default]
    Web,
    /// An image the engine generated; fetchable at higher resolution.
    Generated,
}

/// An image referenced by an engine response, not yet downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducedImage {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub kind: ImageKind,
    /// Cookies required to fetch `url`, scoped to this request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<HashMap<String, String>>,
}

/// Output of one engine turn.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineOutput {
    pub text: String,
    /// New continuation cursor, replacing the previous one wholesale.
    #[serde(default)]
    pub metadata: Vec<Option<String>>,
    #[serde(default)]
    pub images: Vec<ProducedImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thoughts: Option<String>,
}

/// A conversation engine capable of answering one turn.
#[async_trait]
pub trait ConversationEngine: Send + Sync {
    async fn send(&self, request: EngineRequest) -> Result<EngineOutput, EngineError>;
}
