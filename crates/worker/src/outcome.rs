use imgedit_core::error::CoreError;

/// Message stored on a task that failed for a reason the caller cannot act on.
pub const GENERIC_FAILURE: &str = "Internal error while processing task";

/// Error text recorded on a failed task.
///
/// Engine failures, invalid input and download failures are described to
/// the caller. Everything else gets [`GENERIC_FAILURE`] and is logged.
pub fn failure_message(err: &CoreError) -> String {
    match err {
        CoreError::UpstreamDomain(e) => e.to_string(),
        CoreError::InvalidInput(msg) => msg.clone(),
        CoreError::UpstreamTransport(msg) => format!("Failed to fetch image: {msg}"),
        CoreError::NotFound { .. }
        | CoreError::Conflict(_)
        | CoreError::Overloaded(_)
        | CoreError::Unexpected(_) => {
            tracing::error!(error = %err, "Task failed with unexpected error");
            GENERIC_FAILURE.to_string()
        }
    }
}
