//! The conversation-turn pipeline.
//!
//! - [`images`]: concurrent download of caller-supplied input images into a
//!   per-request scratch directory, and concurrent fetch + persist of the
//!   images an engine turn produced.
//! - [`conversation`]: [`ConversationService`], the single code path for a
//!   turn, shared by the synchronous API and the background task runner.

pub mod conversation;
pub mod error;
pub mod images;

pub use conversation::ConversationService;
pub use error::ImageFetchError;
pub use images::{ImagePipeline, PipelineConfig, ScratchBatch};
