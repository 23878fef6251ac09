//! Domain types shared across the imgedit workspace.
//!
//! - [`error::CoreError`]: the closed error taxonomy.
//! - [`engine`]: the conversation engine contract.
//! - [`session`] / [`task`]: records kept by the in-memory stores.
//! - [`conversation`]: request and response shapes of one conversation turn.

pub mod conversation;
pub mod engine;
pub mod error;
pub mod gem;
pub mod model;
pub mod session;
pub mod task;
pub mod types;
pub mod validation;
