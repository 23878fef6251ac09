//! Download of caller-supplied input images.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::fetch_bytes;
use crate::error::ImageFetchError;

/// Name used when a URL has no usable path segment.
const FALLBACK_FILENAME: &str = "image";

/// Extension appended to collision-renamed files that had none.
const FALLBACK_EXTENSION: &str = ".bin";

/// Downloaded input files of one request.
///
/// Owns the scratch directory: dropping the batch deletes the directory and
/// every file in it.
#[derive(Debug)]
pub struct ScratchBatch {
    dir: Option<TempDir>,
    files: Vec<PathBuf>,
}

impl ScratchBatch {
    fn empty() -> Self {
        Self {
            dir: None,
            files: Vec::new(),
        }
    }

    /// Local paths, in the order the URLs were given.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// The scratch directory, if any file was downloaded.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_ref().map(TempDir::path)
    }
}

/// Download every URL concurrently into a new scratch directory.
pub async fn fetch_inputs(
    client: &reqwest::Client,
    urls: &[String],
) -> Result<ScratchBatch, ImageFetchError> {
    if urls.is_empty() {
        return Ok(ScratchBatch::empty());
    }

    let dir = tempfile::Builder::new()
        .prefix("imgedit-inputs-")
        .tempdir()
        .map_err(|e| ImageFetchError::io(std::env::temp_dir(), e))?;

    let downloads = urls
        .iter()
        .zip(assign_filenames(urls))
        .map(|(url, name)| download_to(client, url, dir.path().join(name)));
    let files = futures::future::try_join_all(downloads).await?;

    tracing::debug!(count = files.len(), dir = %dir.path().display(), "Input images downloaded");
    Ok(ScratchBatch {
        dir: Some(dir),
        files,
    })
}

async fn download_to(
    client: &reqwest::Client,
    url: &str,
    target: PathBuf,
) -> Result<PathBuf, ImageFetchError> {
    let (bytes, _mime) = fetch_bytes(client, url, None).await?;
    tokio::fs::write(&target, &bytes)
        .await
        .map_err(|e| ImageFetchError::io(&target, e))?;
    Ok(target)
}

/// Extract a filename from a URL by taking the last path segment.
///
/// Strips query parameters and fragments. Falls back to `"image"` if no
/// meaningful segment is found.
pub fn filename_from_url(url: &str) -> String {
    let clean = url.split(['?', '#']).next().unwrap_or(url);

    let path = if let Some(rest) = clean
        .strip_prefix("https://")
        .or_else(|| clean.strip_prefix("http://"))
    {
        rest.find('/').map(|i| &rest[i..]).unwrap_or("")
    } else {
        clean
    };

    match path.rsplit('/').find(|s| !s.is_empty()) {
        Some(segment) if segment != "." && segment != ".." && !segment.contains('\\') => {
            segment.to_string()
        }
        _ => FALLBACK_FILENAME.to_string(),
    }
}

/// Pick a distinct filename for every URL, in input order.
///
/// The first occurrence keeps its name; later ones become `{stem}_{n}{ext}`.
pub fn assign_filenames(urls: &[String]) -> Vec<String> {
    let mut taken = HashSet::new();
    urls.iter()
        .map(|url| {
            let base = filename_from_url(url);
            let mut candidate = base.clone();
            let mut n = 0;
            while !taken.insert(candidate.clone()) {
                n += 1;
                candidate = with_suffix(&base, n);
            }
            candidate
        })
        .collect()
}

fn with_suffix(name: &str, n: usize) -> String {
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
    format!("{stem}_{n}{ext}")
}
