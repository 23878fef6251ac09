//! Webhook delivery with exponential-backoff retry.
//!
//! [`WebhookNotifier`] POSTs a JSON payload to a callback URL. Any response
//! below HTTP 400 counts as delivered. Failed attempts are retried up to
//! `max_attempts` in total, sleeping `base_delay * 2^(k-1)` after the k-th
//! failure (1 s, 2 s, ... with the default base). Delivery is at-least-once:
//! a receiver whose acknowledgement got lost will see the payload again and
//! should deduplicate on `task_id`.

use std::time::Duration;

use serde::Serialize;

/// Default HTTP request timeout for a single delivery attempt.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default number of attempts, first one included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for a single webhook delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server answered with a status code >= 400.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),

    /// The payload could not be encoded as JSON.
    #[error("Payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Retry and timeout policy for webhook delivery.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Timeout applied to each POST individually.
    pub request_timeout: Duration,
    /// Sleep after the first failed attempt; doubles after each further one.
    pub base_delay: Duration,
    /// Attempts per notification, first one included.
    pub max_attempts: u32,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            base_delay: DEFAULT_BASE_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Delay to sleep after failed attempt number `attempt` (1-indexed).
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor)
}

// ---------------------------------------------------------------------------
// WebhookNotifier
// ---------------------------------------------------------------------------

/// Delivers task outcomes to external webhook endpoints.
pub struct WebhookNotifier {
    client: reqwest::Client,
    config: WebhookConfig,
}

impl WebhookNotifier {
    /// Create a notifier with a pre-configured HTTP client.
    pub fn new(config: WebhookConfig) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// The policy this notifier was built with.
    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    /// Deliver `payload` to `url`, retrying up to `max_attempts` times.
    ///
    /// Returns `true` on the first successful attempt and `false` once every
    /// attempt has failed. Never returns an error: exhaustion is logged and
    /// left to the caller to ignore. A `max_attempts` of zero still makes one
    /// attempt.
    pub async fn notify<T>(&self, url: &str, payload: &T, max_attempts: u32) -> bool
    where
        T: Serialize + ?Sized,
    {
        let body = match serde_json::to_value(payload) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(url, error = %WebhookError::from(e), "Webhook payload not deliverable");
                return false;
            }
        };

        let max_attempts = max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match self.try_send(url, &body).await {
                Ok(()) => {
                    tracing::info!(url, attempt, "Webhook delivered");
                    return true;
                }
                Err(e) if attempt < max_attempts => {
                    let delay = backoff_delay(self.config.base_delay, attempt);
                    tracing::warn!(
                        attempt,
                        url,
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "Webhook delivery attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(
                        url,
                        attempts = max_attempts,
                        error = %e,
                        "Webhook delivery failed after all retries"
                    );
                }
            }
        }
        false
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(&self, url: &str, body: &serde_json::Value) -> Result<(), WebhookError> {
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(WebhookError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
