//! External delivery channels.
//!
//! Only webhooks exist today; each channel owns its retry policy.

pub mod webhook;
