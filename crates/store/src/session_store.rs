use std::collections::HashMap;

use imgedit_core::error::CoreError;
use imgedit_core::session::SessionData;
use tokio::sync::Mutex;

const ENTITY: &str = "Session";

/// Registry of conversation continuation state, keyed by session id.
///
/// Designed to be wrapped in `Arc` and shared across handlers.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionData>>,
}

impl SessionStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Insert a session, replacing any existing entry with the same id.
    pub async fn create(&self, id: &str, data: SessionData) {
        self.sessions.lock().await.insert(id.to_string(), data);
        tracing::debug!(session_id = %id, "Session stored");
    }

    /// Return a copy of the session.
    pub async fn get(&self, id: &str) -> Result<SessionData, CoreError> {
        self.sessions
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(ENTITY, id))
    }

    /// Replace the continuation metadata of a session and bump `updated_at`.
    pub async fn update_metadata(
        &self,
        id: &str,
        metadata: Vec<Option<String>>,
    ) -> Result<(), CoreError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found(ENTITY, id))?;
        session.metadata = metadata;
        session.updated_at = chrono::Utc::now();
        Ok(())
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
