use serde::{Deserialize, Serialize};

use crate::gem::Gem;
use crate::model::Model;
use crate::types::Timestamp;

/// Continuation state of one multi-turn conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Engine continuation cursor; replaced wholesale on every turn.
    pub metadata: Vec<Option<String>>,
    pub model: Model,
    pub gem: Gem,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SessionData {
    /// A fresh session with both timestamps set to now.
    pub fn new(metadata: Vec<Option<String>>, model: Model, gem: Gem) -> Self {
        let now = chrono::Utc::now();
        Self {
            metadata,
            model,
            gem,
            created_at: now,
            updated_at: now,
        }
    }
}
