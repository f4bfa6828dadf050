//! Configuration management for the vBulletin API client.
//!
//! This module provides TOML-based configuration file loading and saving.
//! The default configuration path is `~/.config/vbapi/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default time a caller waits for session initialization.
pub const DEFAULT_INIT_TIMEOUT_SECS: u64 = 5;

/// Default timeout for a single HTTP round trip.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default client name, sent as User-Agent and in the handshake.
pub const DEFAULT_CLIENT_NAME: &str = "vbapi-rs";

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    MissingField(&'static str),

    #[error("api url must start with http:// or https://, got {0}")]
    InvalidApiUrl(String),

    #[error("{0} must be greater than 0")]
    InvalidTimeout(&'static str),

    #[error("log level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for the API client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Remote endpoint and shared key.
    pub api: ApiConfig,

    /// Platform identity reported during the handshake.
    pub platform: PlatformConfig,

    /// Client identity reported during the handshake.
    pub client: ClientConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Remote endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Full URL of the RPC endpoint, e.g. `https://forum.example.com/api.php`.
    pub url: String,

    /// API key configured in the forum's admin panel.
    pub key: String,

    /// Seconds a caller waits for session initialization.
    pub init_timeout_secs: u64,

    /// Seconds allowed for a single HTTP round trip.
    pub request_timeout_secs: u64,
}

/// Platform identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlatformConfig {
    pub name: String,
    pub version: String,
}

/// Client identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub name: String,
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    pub level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            key: String::new(),
            init_timeout_secs: DEFAULT_INIT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            name: "vbapi".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_CLIENT_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vbapi")
        .join("config.toml")
}

impl Config {
    /// Creates a configuration for the given endpoint, key and platform.
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        platform_name: impl Into<String>,
        platform_version: impl Into<String>,
    ) -> Self {
        let mut config = Self::default();
        config.api.url = api_url.into();
        config.api.key = api_key.into();
        config.platform.name = platform_name.into();
        config.platform.version = platform_version.into();
        config
    }

    /// Time a caller waits for session initialization.
    pub fn init_timeout(&self) -> Duration {
        Duration::from_secs(self.api.init_timeout_secs)
    }

    /// Timeout for a single HTTP round trip.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    /// Names of the handshake prerequisites that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("api.url", &self.api.url),
            ("api.key", &self.api.key),
            ("platform.name", &self.platform.name),
            ("platform.version", &self.platform.version),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values.
    /// Supported variables:
    /// - VBAPI_URL: Override the API endpoint
    /// - VBAPI_KEY: Override the API key
    /// - VBAPI_LOG_LEVEL: Override log level (trace, debug, info, warn, error)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("VBAPI_URL") {
            if !url.is_empty() {
                tracing::info!("Overriding api url from environment: {}", url);
                self.api.url = url;
            }
        }

        if let Ok(key) = std::env::var("VBAPI_KEY") {
            if !key.is_empty() {
                tracing::info!("Overriding api key from environment");
                self.api.key = key;
            }
        }

        if let Ok(level) = std::env::var("VBAPI_LOG_LEVEL") {
            if !level.is_empty() {
                tracing::info!("Overriding log level from environment: {}", level);
                self.logging.level = level;
            }
        }
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(field) = self.missing_fields().into_iter().next() {
            return Err(ConfigError::MissingField(field));
        }

        let url = &self.api.url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::InvalidApiUrl(url.clone()));
        }

        if self.api.init_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("api.init_timeout_secs"));
        }
        if self.api.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("api.request_timeout_secs"));
        }

        let level = self.logging.level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.logging.level.clone()));
        }

        Ok(())
    }

    /// Load configuration from a file.
    ///
    /// If the file does not exist, returns the default configuration.
    /// If the file exists but is invalid TOML, returns an error with
    /// a helpful message.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {}", format_toml_error(&e)))
    }

    /// Save configuration to a file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = self.to_toml()?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

/// Format a TOML deserialization error for user-friendly display.
fn format_toml_error(error: &toml::de::Error) -> String {
    let mut msg = error.message().to_string();

    if let Some(span) = error.span() {
        msg.push_str(&format!(" (at position {}..{})", span.start, span.end));
    }

    msg
}
