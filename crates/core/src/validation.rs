//! Input validation shared by the API and the conversation service.

use crate::error::CoreError;

/// Validate that a prompt contains something other than whitespace.
pub fn validate_prompt(prompt: &str) -> Result<(), CoreError> {
    if prompt.trim().is_empty() {
        return Err(CoreError::InvalidInput(
            "prompt cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validate that `url` is non-empty and uses `http` or `https`.
///
/// `field` names the offending request field in the error message.
pub fn validate_http_url(field: &str, url: &str) -> Result<(), CoreError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput(format!("{field} must not be empty")));
    }
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(CoreError::InvalidInput(format!(
            "{field} must be an http:// or https:// URL, got: '{trimmed}'"
        ))),
    }
}

/// Validate every image URL of a request.
pub fn validate_image_urls(urls: &[String]) -> Result<(), CoreError> {
    urls.iter()
        .try_for_each(|url| validate_http_url("image_urls", url))
}
