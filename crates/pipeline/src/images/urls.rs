use std::path::Path;

/// Path prefix the API serves the output directory under when no public
/// base URL is configured.
pub const DEFAULT_MOUNT_PREFIX: &str = "/images";

/// Public URL of a stored image.
///
/// Paths outside `output_dir` are addressed by their bare filename.
pub fn public_url(path: &Path, output_dir: &Path, base_url: Option<&str>) -> String {
    let relative = match path.strip_prefix(output_dir) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        _ => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    let prefix = base_url
        .map(|b| b.trim_end_matches('/'))
        .filter(|b| !b.is_empty())
        .unwrap_or(DEFAULT_MOUNT_PREFIX);
    format!("{prefix}/{relative}")
}
