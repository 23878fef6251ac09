//! Model names accepted by the conversation engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A model the conversation engine can be asked to use.
///
/// Serialized as its public name (e.g. `"gemini-2.5-flash"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Model {
    /// Let the engine pick its default model.
    #[default]
    #[serde(rename = "unspecified")]
    Unspecified,
    #[serde(rename = "gemini-2.5-flash")]
    Gemini25Flash,
    #[serde(rename = "gemini-2.5-pro")]
    Gemini25Pro,
    #[serde(rename = "gemini-2.0-flash")]
    Gemini20Flash,
    #[serde(rename = "gemini-2.0-flash-thinking")]
    Gemini20FlashThinking,
}

/// Every known model, in the order they are listed to callers.
pub const ALL_MODELS: [Model; 5] = [
    Model::Unspecified,
    Model::Gemini25Flash,
    Model::Gemini25Pro,
    Model::Gemini20Flash,
    Model::Gemini20FlashThinking,
];

impl Model {
    /// Public name of the model.
    pub fn name(self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Gemini25Flash => "gemini-2.5-flash",
            Self::Gemini25Pro => "gemini-2.5-pro",
            Self::Gemini20Flash => "gemini-2.0-flash",
            Self::Gemini20FlashThinking => "gemini-2.0-flash-thinking",
        }
    }

    /// Parse a model from its public name.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        ALL_MODELS
            .into_iter()
            .find(|m| m.name() == name.trim())
            .ok_or_else(|| {
                let valid: Vec<&str> = ALL_MODELS.iter().map(|m| m.name()).collect();
                CoreError::InvalidInput(format!(
                    "Invalid model: '{name}'. Valid models: {}",
                    valid.join(", ")
                ))
            })
    }

    /// Resolve an optional caller-supplied name; absent means [`Model::Unspecified`].
    pub fn resolve(name: Option<&str>) -> Result<Self, CoreError> {
        match name {
            None => Ok(Self::Unspecified),
            Some(name) => Self::from_name(name),
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
