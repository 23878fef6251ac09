//! Background execution of conversation tasks.
//!
//! [`TaskRunner`] owns a bounded queue of task ids and a fixed pool of
//! worker loops draining it. Each task is driven from `pending` to a
//! terminal status and its outcome is delivered to the task's webhook
//! exactly once.

pub mod outcome;
pub mod runner;

pub use outcome::failure_message;
pub use runner::{RunnerConfig, RunnerDeps, TaskRunner};
