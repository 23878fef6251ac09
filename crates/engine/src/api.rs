//! REST client for the conversation engine's HTTP endpoint.
//!
//! Protocol:
//!
//! ```text
//! POST {url}/generate
//! { "prompt", "model", "gem", "metadata", "files": [{ "filename", "data" }] }
//!
//! 2xx  -> EngineOutput JSON
//! 4xx/5xx -> { "kind": "quota_exceeded", "message": "..." }
//! ```
//!
//! Input images are read from disk and sent base64-encoded.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use imgedit_core::engine::{ConversationEngine, EngineError, EngineOutput, EngineRequest};
use imgedit_core::gem::Gem;
use imgedit_core::model::Model;
use serde::{Deserialize, Serialize};

/// Default per-request timeout; generation can be slow.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Connection settings for the engine endpoint.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base HTTP URL, e.g. `http://engine:9000`.
    pub url: String,
    /// Sent as a bearer token when set.
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Optional outbound proxy URL.
    pub proxy: Option<String>,
}

impl EngineConfig {
    /// Config for `url` with no credentials, no proxy and the default timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            proxy: None,
        }
    }
}

/// Errors from the engine REST layer, before classification into
/// [`EngineError`] kinds.
#[derive(Debug, thiserror::Error)]
pub enum EngineApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The engine returned a non-2xx status code.
    #[error("Engine API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// An input image could not be read from the scratch directory.
    #[error("Failed to read input file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    model: Model,
    gem: &'a Gem,
    metadata: &'a Option<Vec<Option<String>>>,
    files: Vec<EncodedFile>,
}

#[derive(Serialize)]
struct EncodedFile {
    filename: String,
    data: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    kind: String,
    #[serde(default)]
    message: String,
}

/// HTTP client for one engine endpoint.
pub struct EngineApi {
    client: reqwest::Client,
    config: EngineConfig,
}

impl EngineApi {
    /// Build a client from `config`, applying its timeout and proxy.
    pub fn new(config: EngineConfig) -> Result<Self, EngineApiError> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout);
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: EngineConfig) -> Self {
        Self { client, config }
    }

    /// Run one turn against the engine.
    pub async fn generate(&self, request: &EngineRequest) -> Result<EngineOutput, EngineApiError> {
        let body = GenerateRequest {
            prompt: &request.prompt,
            model: request.model,
            gem: &request.gem,
            metadata: &request.metadata,
            files: encode_files(&request.files).await?,
        };

        let mut builder = self
            .client
            .post(format!("{}/generate", self.config.url.trim_end_matches('/')))
            .json(&body);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(EngineApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<EngineOutput>().await?)
    }
}

#[async_trait]
impl ConversationEngine for EngineApi {
    async fn send(&self, request: EngineRequest) -> Result<EngineOutput, EngineError> {
        self.generate(&request).await.map_err(|e| {
            tracing::warn!(model = %request.model, error = %e, "Engine call failed");
            EngineError::from(e)
        })
    }
}

impl From<EngineApiError> for EngineError {
    fn from(err: EngineApiError) -> Self {
        match err {
            EngineApiError::ApiError { status, body } => classify_error_body(status, &body),
            EngineApiError::Request(e) if e.is_timeout() => EngineError::Timeout(e.to_string()),
            other => EngineError::Generation(other.to_string()),
        }
    }
}

/// Map an error response onto an engine failure kind.
///
/// A structured `{kind, message}` body wins; otherwise the status code
/// decides (429 -> quota, 408/504 -> timeout, everything else -> generation).
fn classify_error_body(status: u16, body: &str) -> EngineError {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        let message = if parsed.message.is_empty() {
            format!("engine returned HTTP {status}")
        } else {
            parsed.message
        };
        return match parsed.kind.as_str() {
            "invalid_model" => EngineError::InvalidModel(message),
            "quota_exceeded" | "usage_limit_exceeded" => EngineError::QuotaExceeded(message),
            "temporarily_blocked" => EngineError::TemporarilyBlocked(message),
            "timeout" => EngineError::Timeout(message),
            _ => EngineError::Generation(message),
        };
    }

    let message = format!("engine returned HTTP {status}: {body}");
    match status {
        429 => EngineError::QuotaExceeded(message),
        408 | 504 => EngineError::Timeout(message),
        _ => EngineError::Generation(message),
    }
}

async fn encode_files(paths: &[PathBuf]) -> Result<Vec<EncodedFile>, EngineApiError> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| EngineApiError::File {
                path: path.clone(),
                source,
            })?;
        files.push(EncodedFile {
            filename: file_name(path),
            data: BASE64_STANDARD.encode(bytes),
        });
    }
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}
