//! Outbound notifications for terminal task outcomes.
//!
//! - [`delivery::webhook`]: JSON POST to a caller-supplied callback URL with
//!   bounded retries and exponential backoff.

pub mod delivery;

pub use delivery::webhook::{WebhookConfig, WebhookNotifier};
