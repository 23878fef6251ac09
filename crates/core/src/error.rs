use crate::engine::EngineError;

/// Domain error shared by every crate in the workspace.
///
/// One variant per failure kind callers must tell apart. Boundaries that
/// decide between "surface to caller", "fail the task" and "retry" match on
/// this enum exhaustively.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// Unresolvable model name, blank prompt, malformed URL.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Image download or other network failure talking to a remote host.
    #[error("Upstream transport error: {0}")]
    UpstreamTransport(String),

    /// A failure reported by the conversation engine itself.
    #[error(transparent)]
    UpstreamDomain(#[from] EngineError),

    /// Rejected state change, e.g. leaving a terminal task status.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The background task queue has no free slot.
    #[error("Overloaded: {0}")]
    Overloaded(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::NotFound`] on the given entity.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}
