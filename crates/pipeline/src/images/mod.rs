//! Image acquisition: input downloads and output persistence.
//!
//! Both directions fan out one request per image with no concurrency limit
//! and fan back in preserving input order. Either direction is
//! all-or-nothing: the first failure aborts the batch.

pub mod inputs;
pub mod outputs;
pub mod urls;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use imgedit_core::conversation::ImagePayload;
use imgedit_core::engine::ProducedImage;
use reqwest::header::{CONTENT_TYPE, COOKIE};

use crate::error::ImageFetchError;

pub use inputs::ScratchBatch;

/// Default directory produced images are written to.
pub const DEFAULT_OUTPUT_DIR: &str = "/data/outputs";

/// Default per-request timeout for one image download.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where produced images go and how they are addressed publicly.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Durable output directory; created on first use.
    pub output_dir: PathBuf,
    /// Public base URL the output directory is served under. `None` means
    /// the API serves it itself under [`urls::DEFAULT_MOUNT_PREFIX`].
    pub base_url: Option<String>,
    /// Optional outbound proxy for every image fetch.
    pub proxy: Option<String>,
    /// Per-request timeout; a host that never answers fails the batch.
    pub timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            base_url: None,
            proxy: None,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Shared HTTP client plus output settings for image transfers.
pub struct ImagePipeline {
    client: reqwest::Client,
    output_dir: PathBuf,
    base_url: Option<String>,
}

impl ImagePipeline {
    /// Build a pipeline with its own HTTP client (redirects followed),
    /// applying the configured timeout and proxy.
    pub fn new(config: PipelineConfig) -> Result<Self, ImageFetchError> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout);
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(Self::with_client(builder.build()?, config))
    }

    /// Create a pipeline reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: PipelineConfig) -> Self {
        Self {
            client,
            output_dir: config.output_dir,
            base_url: config
                .base_url
                .map(|b| b.trim_end_matches('/').to_string())
                .filter(|b| !b.is_empty()),
        }
    }

    /// Download `urls` into a fresh scratch directory.
    pub async fn fetch_inputs(&self, urls: &[String]) -> Result<ScratchBatch, ImageFetchError> {
        inputs::fetch_inputs(&self.client, urls).await
    }

    /// Fetch and store every produced image in the output directory.
    pub async fn persist_outputs(
        &self,
        images: &[ProducedImage],
    ) -> Result<Vec<ImagePayload>, ImageFetchError> {
        outputs::persist_outputs(&self.client, &self.output_dir, images).await
    }

    /// Fill in the public `url` of every payload.
    pub async fn assign_urls(&self, payloads: &mut [ImagePayload]) {
        // Stored paths are canonical, so compare against the canonical root.
        let root = tokio::fs::canonicalize(&self.output_dir)
            .await
            .unwrap_or_else(|_| self.output_dir.clone());
        for payload in payloads.iter_mut() {
            payload.url = Some(urls::public_url(
                Path::new(&payload.path),
                &root,
                self.base_url.as_deref(),
            ));
        }
    }
}

/// GET `url` and return its body and mime type (parameters stripped).
pub(crate) async fn fetch_bytes(
    client: &reqwest::Client,
    url: &str,
    cookies: Option<&HashMap<String, String>>,
) -> Result<(Vec<u8>, String), ImageFetchError> {
    let mut request = client.get(url);
    if let Some(cookies) = cookies.filter(|c| !c.is_empty()) {
        request = request.header(COOKIE, cookie_header(cookies));
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ImageFetchError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let mime = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(mime_essence)
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let bytes = response.bytes().await?;
    Ok((bytes.to_vec(), mime))
}

/// `image/png; charset=binary` -> `image/png`.
fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase()
}

/// Render cookies as a `Cookie` header value, sorted by name.
fn cookie_header(cookies: &HashMap<String, String>) -> String {
    let mut pairs: Vec<_> = cookies.iter().collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("; ")
}
