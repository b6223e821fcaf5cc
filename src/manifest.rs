//! Static File Manifest
//!
//! The build artifacts pre-warmed into the static partition at install.
//! The list is generated by the frontend build and baked in here; a
//! deployment may point `MANIFEST_PATH` at a fresher JSON array instead.

use std::fs;
use std::path::Path;

use crate::error::{CacheError, Result};

/// Build output pre-warmed at install, in order.
pub const STATIC_FILES: &[&str] = &[
    "/",
    "/index.html",
    "/manifest.json",
    "/favicon.ico",
    "/logo192.png",
    "/logo512.png",
    "/static/css/main.css",
    "/static/js/main.js",
    "/static/js/runtime-main.js",
    "/static/js/vendors-main.chunk.js",
];

/// Returns the baked-in manifest.
pub fn default_manifest() -> Vec<String> {
    STATIC_FILES.iter().map(|path| path.to_string()).collect()
}

/// Loads a manifest from a JSON array of absolute URL paths.
pub fn load_manifest(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| CacheError::Config(format!("reading manifest {}: {}", path.display(), e)))?;
    parse_manifest(&raw)
}

/// Parses a manifest, rejecting entries that are not absolute paths.
pub fn parse_manifest(raw: &str) -> Result<Vec<String>> {
    let files: Vec<String> = serde_json::from_str(raw)
        .map_err(|e| CacheError::Config(format!("invalid manifest: {}", e)))?;

    if let Some(bad) = files.iter().find(|file| !file.starts_with('/')) {
        return Err(CacheError::Config(format!(
            "manifest entry '{}' is not an absolute path",
            bad
        )));
    }

    Ok(files)
}
