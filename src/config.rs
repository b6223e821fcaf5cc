//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Message carried by the JSON offline response.
pub const DEFAULT_OFFLINE_MESSAGE: &str = "Network unavailable. Please check your connection.";

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// The TTL and janitor interval are deliberately absent: they are fixed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Origin server every request is forwarded to
    pub origin_url: String,
    /// HTTP server port
    pub server_port: u16,
    /// Message in the offline JSON body
    pub offline_message: String,
    /// JSON manifest overriding the baked-in static file list
    pub manifest_path: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `ORIGIN_URL` - Origin server URL (default: http://127.0.0.1:8080)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `OFFLINE_MESSAGE` - Message served in offline API responses
    /// - `MANIFEST_PATH` - Optional JSON array of paths to pre-cache
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            origin_url: env::var("ORIGIN_URL").unwrap_or(defaults.origin_url),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            offline_message: env::var("OFFLINE_MESSAGE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.offline_message),
            manifest_path: env::var_os("MANIFEST_PATH").map(PathBuf::from),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin_url: "http://127.0.0.1:8080".to_string(),
            server_port: 3000,
            offline_message: DEFAULT_OFFLINE_MESSAGE.to_string(),
            manifest_path: None,
        }
    }
}
