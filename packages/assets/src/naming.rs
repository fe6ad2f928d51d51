//! Content-addressed asset names.
//!
//! An asset lives at `assets/<digest>.<ext>` where `<digest>` is the
//! SHA-256 of its bytes in lower-case hex, truncated, and `<ext>` is the
//! lower-cased extension of the name it was imported under. Identical bytes
//! imported under different names share one path.

use sha2::{Digest, Sha256};

/// Directory holding assets, relative to the entry folder
pub const ASSETS_DIR: &str = "assets";

/// Default digest length in hex characters
pub const DEFAULT_DIGEST_LENGTH: usize = 16;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg", "ico", "avif"];

/// Truncated lower-case hex SHA-256 of `bytes`
pub fn content_id(bytes: &[u8], len: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = format!("{:x}", hasher.finalize());
    let len = len.clamp(1, digest.len());
    digest[..len].to_string()
}

/// Asset path for `bytes` imported under `original_name`
pub fn asset_path_for(bytes: &[u8], original_name: &str, len: usize) -> String {
    let digest = content_id(bytes, len);
    match extension_of(original_name) {
        Some(ext) => format!("{}/{}.{}", ASSETS_DIR, digest, ext),
        None => format!("{}/{}", ASSETS_DIR, digest),
    }
}

/// Lower-cased extension of a file name
pub fn extension_of(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_ascii_lowercase()),
        _ => None,
    }
}

/// Final component of a path, as shown to the user
pub fn display_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// File name of an asset path inside `assets/`; `None` for anything else
pub fn asset_file_name(asset_path: &str) -> Option<&str> {
    let name = asset_path.strip_prefix(ASSETS_DIR)?.strip_prefix('/')?;
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return None;
    }
    Some(name)
}

pub fn is_image_name(name: &str) -> bool {
    extension_of(name)
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Normalize an extension for icon lookup: trimmed, lower-cased, at most
/// 20 characters of `[a-z0-9.]`
pub fn sanitize_extension(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .take(20)
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
        .collect()
}
