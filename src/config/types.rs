//! Configuration type definitions.
//!
//! The on-disk format is the tool's `environment.toml`. Key names under
//! `[export]` and `[import]` are camelCase because they are passed through to
//! the platform's query parameters unchanged.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Expand tilde (~) prefix to the user's home directory.
/// Handles both "~" alone and "~/path/to/something" patterns.
pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Main configuration structure parsed from environment.toml.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Operator account used for registration (Basic auth) and the password grant.
    pub username: String,
    pub password: String,

    /// Space-separated token scopes requested with the password grant.
    pub scopes: String,

    pub apim: ApimConfig,
    pub dynamic_client_registration: DcrConfig,
    pub export: ExportConfig,
    pub import: ImportConfig,

    /// Key manager identifiers whose OAuth keys are remapped on import.
    pub keymanagers: Vec<String>,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

/// Connection endpoint of the API Manager instance.
#[derive(Debug, Clone, Deserialize)]
pub struct ApimConfig {
    pub hostname: String,
}

/// Identity this tool registers itself under (dynamic client registration).
#[derive(Debug, Clone, Deserialize)]
pub struct DcrConfig {
    pub callback_url: String,
    pub client_name: String,
    pub owner: String,
    pub grant_types: String,
    pub saas_app: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Whether OAuth keys are embedded in exported archives.
    #[serde(rename = "withKeys")]
    pub with_keys: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    #[serde(rename = "preserveOwner")]
    pub preserve_owner: bool,
    #[serde(rename = "skipSubscriptions")]
    pub skip_subscriptions: bool,
    #[serde(rename = "skipApplicationKeys")]
    pub skip_application_keys: bool,
    /// Update an application that already exists instead of failing.
    pub update: bool,
}

/// Diagnostic logging toggles.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LogConfig {
    /// Log full response bodies at debug level.
    #[serde(default)]
    pub response: bool,
    /// Log archive metadata and key details at debug level.
    #[serde(default)]
    pub debug: bool,
}

/// HTTP behaviour tuning. Optional; the defaults are safe.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Accept self-signed certificates from the platform endpoint.
    pub insecure_skip_verify: bool,
    /// Minimum interval between export/map-keys calls, in milliseconds.
    /// 0 disables throttling.
    pub throttle_ms: u64,
    /// Directory where archives are written on export and discovered on import.
    pub archive_dir: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            insecure_skip_verify: false,
            throttle_ms: 1000,
            archive_dir: "exported".to_string(),
        }
    }
}

impl Config {
    /// The configured hostname without any trailing slash.
    pub fn hostname(&self) -> &str {
        self.apim.hostname.trim_end_matches('/')
    }

    /// The archive directory, with ~ expanded.
    pub fn archive_dir(&self) -> PathBuf {
        expand_tilde(&self.http.archive_dir)
    }

    /// The minimum inter-call interval for throttled endpoints.
    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.http.throttle_ms)
    }
}
