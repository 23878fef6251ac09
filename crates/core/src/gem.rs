use serde::{Deserialize, Serialize};

/// Persona/tool selection passed through to the conversation engine.
///
/// Resolved once at the API boundary from an optional string; serialized
/// back as `null` or the gem id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Gem {
    Named(String),
    #[default]
    Unset,
}

impl From<Option<String>> for Gem {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(id) if !id.trim().is_empty() => Self::Named(id.trim().to_string()),
            _ => Self::Unset,
        }
    }
}

impl From<Gem> for Option<String> {
    fn from(value: Gem) -> Self {
        match value {
            Gem::Named(id) => Some(id),
            Gem::Unset => None,
        }
    }
}
