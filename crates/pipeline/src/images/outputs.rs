//! Persistence of engine-produced images into the output directory.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use imgedit_core::conversation::ImagePayload;
use imgedit_core::engine::{ImageKind, ProducedImage};
use tokio::io::AsyncWriteExt;

use super::fetch_bytes;
use crate::error::ImageFetchError;

/// Size hint appended to generated-image URLs to get the full resolution.
pub const HIGH_RES_SUFFIX: &str = "=s2048";

/// Fetch every produced image concurrently and store it under `output_dir`.
///
/// Payloads come back in the order of `images`.
pub async fn persist_outputs(
    client: &reqwest::Client,
    output_dir: &Path,
    images: &[ProducedImage],
) -> Result<Vec<ImagePayload>, ImageFetchError> {
    if images.is_empty() {
        return Ok(Vec::new());
    }

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| ImageFetchError::io(output_dir, e))?;

    let saves = images
        .iter()
        .map(|image| persist_one(client, output_dir, image));
    let payloads = futures::future::try_join_all(saves).await?;

    tracing::debug!(count = payloads.len(), dir = %output_dir.display(), "Output images persisted");
    Ok(payloads)
}

async fn persist_one(
    client: &reqwest::Client,
    output_dir: &Path,
    image: &ProducedImage,
) -> Result<ImagePayload, ImageFetchError> {
    let url = source_url(image);
    let (bytes, mime_type) = fetch_bytes(client, &url, image.cookies.as_ref()).await?;

    let target = output_dir.join(output_filename(Utc::now(), &extension_for_mime(&mime_type)));
    write_new(&target, &bytes).await?;
    let path = absolute(&target).await;

    Ok(ImagePayload {
        title: image.title.clone(),
        alt: image.alt.clone(),
        mime_type,
        data: BASE64_STANDARD.encode(&bytes),
        path: path.to_string_lossy().into_owned(),
        url: None,
    })
}

/// URL to fetch for `image`; generated images ask for the high-res variant.
pub fn source_url(image: &ProducedImage) -> String {
    match image.kind {
        ImageKind::Generated if !image.url.contains(HIGH_RES_SUFFIX) => {
            format!("{}{HIGH_RES_SUFFIX}", image.url)
        }
        _ => image.url.clone(),
    }
}

/// File extension (with dot) for a mime type without parameters, `.bin`
/// when the type has no registered extension.
pub fn extension_for_mime(mime: &str) -> String {
    match mime {
        // Registered under several extensions; use the common one.
        "image/jpeg" => ".jpg".to_string(),
        "application/octet-stream" => ".bin".to_string(),
        _ => mime_guess::get_mime_extensions_str(mime)
            .and_then(|exts| exts.first())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_else(|| ".bin".to_string()),
    }
}

/// Write `bytes` to a file that must not exist yet.
async fn write_new(path: &Path, bytes: &[u8]) -> Result<(), ImageFetchError> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| ImageFetchError::io(path, e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| ImageFetchError::io(path, e))?;
    file.flush().await.map_err(|e| ImageFetchError::io(path, e))
}

/// `{UTC timestamp with microseconds}_{8 random hex chars}{ext}`.
pub fn output_filename(now: DateTime<Utc>, ext: &str) -> String {
    format!(
        "{}_{:08x}{ext}",
        now.format("%Y%m%d%H%M%S%6f"),
        rand::random::<u32>()
    )
}

async fn absolute(path: &Path) -> PathBuf {
    match tokio::fs::canonicalize(path).await {
        Ok(p) => p,
        Err(_) if path.is_absolute() => path.to_path_buf(),
        Err(_) => std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf()),
    }
}
