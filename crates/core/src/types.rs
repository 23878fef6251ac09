/// Session identifiers are opaque strings handed out to API callers.
pub type SessionId = String;

/// Task identifiers are opaque strings handed out to API callers.
pub type TaskId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a fresh unguessable identifier (122 random bits, hex encoded).
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
