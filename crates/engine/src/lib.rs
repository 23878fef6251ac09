//! HTTP client for a remote conversation engine.
//!
//! [`api::EngineApi`] implements [`imgedit_core::engine::ConversationEngine`]
//! over a small JSON protocol (`POST {base}/generate`).

pub mod api;

pub use api::{EngineApi, EngineApiError, EngineConfig};
