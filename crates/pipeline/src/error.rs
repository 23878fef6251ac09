use std::path::PathBuf;

use imgedit_core::error::CoreError;

/// Errors from downloading or persisting images.
#[derive(Debug, thiserror::Error)]
pub enum ImageFetchError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The image host answered with a non-2xx status code.
    #[error("GET {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// Writing to the scratch or output directory failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ImageFetchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<ImageFetchError> for CoreError {
    fn from(err: ImageFetchError) -> Self {
        match err {
            ImageFetchError::Request(_) | ImageFetchError::HttpStatus { .. } => {
                CoreError::UpstreamTransport(err.to_string())
            }
            ImageFetchError::Io { .. } => CoreError::Unexpected(err.to_string()),
        }
    }
}
