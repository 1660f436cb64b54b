//! Configuration module for tempdrop.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::{Result, TempdropError};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public base URL used to build download links.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: default_base_url(),
        }
    }
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Path to the blob storage directory.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// Path to the metadata snapshot file.
    #[serde(default = "default_metadata_path")]
    pub metadata_path: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Time-to-live of an upload in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
}

/// Largest accepted upload limit (1 TiB).
pub const MAX_UPLOAD_SIZE_MB: u64 = 1024 * 1024;

/// Longest accepted time-to-live (10 years).
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

fn default_storage_path() -> String {
    "uploads".to_string()
}

fn default_metadata_path() -> String {
    "metadata.json".to_string()
}

fn default_max_upload_size() -> u64 {
    128
}

fn default_ttl() -> u64 {
    3 * 60 * 60 // 3 hours
}

impl FilesConfig {
    /// Maximum upload size in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }

    /// Upload time-to-live.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            metadata_path: default_metadata_path(),
            max_upload_size_mb: default_max_upload_size(),
            ttl_secs: default_ttl(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/tempdrop.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web front-end configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// CORS allowed origins (empty = any origin).
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Whether to serve the static browser client.
    #[serde(default = "default_serve_static")]
    pub serve_static: bool,
    /// Path to static files directory.
    #[serde(default = "default_static_path")]
    pub static_path: String,
}

fn default_serve_static() -> bool {
    true
}

fn default_static_path() -> String {
    "public".to_string()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            cors_origins: vec![],
            serve_static: default_serve_static(),
            static_path: default_static_path(),
        }
    }
}

/// Upstream hosting proxy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    /// Whether `/upload-uguu` is exposed.
    #[serde(default = "default_proxy_enabled")]
    pub enabled: bool,
    /// Upstream upload endpoint.
    #[serde(default = "default_proxy_endpoint")]
    pub endpoint: String,
    /// Total request timeout in seconds.
    #[serde(default = "default_proxy_timeout")]
    pub timeout_secs: u64,
    /// Expiry reported to clients for proxied uploads, in seconds.
    #[serde(default = "default_proxy_ttl")]
    pub advertised_ttl_secs: u64,
}

fn default_proxy_enabled() -> bool {
    true
}

fn default_proxy_endpoint() -> String {
    "https://uguu.se/api.php".to_string()
}

fn default_proxy_timeout() -> u64 {
    120
}

fn default_proxy_ttl() -> u64 {
    24 * 60 * 60 // upstream default retention
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: default_proxy_enabled(),
            endpoint: default_proxy_endpoint(),
            timeout_secs: default_proxy_timeout(),
            advertised_ttl_secs: default_proxy_ttl(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// File storage configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web front-end configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Upload proxy configuration.
    #[serde(default)]
    pub proxy: ProxyConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(TempdropError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| TempdropError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables (prefixed names take precedence over
    /// the legacy unprefixed ones):
    /// - `TEMPDROP_BASE_URL` / `BASE_URL`: public base URL
    /// - `TEMPDROP_PORT` / `PORT`: listen port
    /// - `TEMPDROP_HOST`: bind address
    pub fn apply_env_overrides(&mut self) {
        if let Some(base_url) = env_value(&["TEMPDROP_BASE_URL", "BASE_URL"]) {
            self.server.base_url = base_url;
        }

        if let Some(port) = env_value(&["TEMPDROP_PORT", "PORT"]) {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid port override"),
            }
        }

        if let Some(host) = env_value(&["TEMPDROP_HOST"]) {
            self.server.host = host;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.files.ttl_secs == 0 {
            return Err(TempdropError::Config(
                "files.ttl_secs must be greater than zero".to_string(),
            ));
        }

        if self.files.ttl_secs > MAX_TTL_SECS {
            return Err(TempdropError::Config(format!(
                "files.ttl_secs must be at most {MAX_TTL_SECS}"
            )));
        }

        if self.files.max_upload_size_mb == 0 {
            return Err(TempdropError::Config(
                "files.max_upload_size_mb must be greater than zero".to_string(),
            ));
        }

        if self.files.max_upload_size_mb > MAX_UPLOAD_SIZE_MB {
            return Err(TempdropError::Config(format!(
                "files.max_upload_size_mb must be at most {MAX_UPLOAD_SIZE_MB}"
            )));
        }

        url::Url::parse(&self.server.base_url).map_err(|e| {
            TempdropError::Config(format!("invalid server.base_url {:?}: {e}", self.server.base_url))
        })?;

        if self.proxy.enabled {
            url::Url::parse(&self.proxy.endpoint).map_err(|e| {
                TempdropError::Config(format!("invalid proxy.endpoint {:?}: {e}", self.proxy.endpoint))
            })?;
        }

        Ok(())
    }
}

/// First non-empty value among the given environment variables.
fn env_value(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.is_empty())
}
