//! In-memory session and task stores.
//!
//! Both stores guard a single `HashMap` with one `tokio::sync::Mutex`, so
//! every operation on a store serializes against every other one. Reads hand
//! back owned clones; callers never hold a reference into the map.

pub mod session_store;
pub mod task_store;

pub use session_store::SessionStore;
pub use task_store::TaskStore;
