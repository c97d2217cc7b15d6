//! Configuration module for the signal receiver

mod template;

use crate::utils::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub use template::{commented_config_template, generate_commented_config_template};

/// Default config file looked up by the binary when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "signal-receiver.toml";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// HTTP listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Key-value store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Payload handling configuration
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind (overridden by `PORT`)
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Key-value store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Redis connection string (overridden by `REDIS_URL`). When absent the
    /// service still starts and answers webhooks with `STORE_UNAVAILABLE`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Upper bound on each connection attempt, in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Upper bound on a single batched write, in milliseconds
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

/// What to do with payload entries whose value is not a JSON string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValuePolicy {
    /// Fail the whole request with `MALFORMED_JSON`; nothing is written.
    #[default]
    Reject,
    /// Drop the offending entry, log it, and write the rest.
    Skip,
}

/// Payload handling configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default)]
    pub non_string_values: ValuePolicy,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_write_timeout_ms() -> u64 {
    2_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

impl StoreConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

impl ServerConfig {
    /// `host:port` string suitable for `SocketAddr` parsing
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Serialize default config to TOML string
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Load configuration from a specific file path, then apply environment overrides
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::ConfigError(format!("Failed to read config file {:?}: {}", path.as_ref(), e))
        })?;
        let mut cfg: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;
        cfg.merge_env()?;
        Ok(cfg)
    }

    /// Load from `path` when it exists, otherwise defaults; environment applied in both cases
    pub fn load_or_default<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            return Self::from_file(path);
        }
        log::warn!("Configuration file {:?} not found - using defaults", path.as_ref());
        let mut config = Self::default();
        config.merge_env()?;
        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::ConfigError(format!("Failed to create directory {:?}: {}", parent, e))
                })?;
            }
        }
        std::fs::write(path, content).map_err(|e| {
            Error::ConfigError(format!("Failed to write config file {:?}: {}", path, e))
        })?;
        Ok(())
    }

    /// Validate the configuration for required fields and reasonable values
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(Error::ConfigError("server.host must be set".to_string()));
        }
        if self.server.port == 0 {
            return Err(Error::ConfigError("server.port must be > 0".to_string()));
        }
        if self.store.connect_timeout_ms == 0 {
            return Err(Error::ConfigError("store.connect_timeout_ms must be > 0".to_string()));
        }
        if self.store.write_timeout_ms == 0 {
            return Err(Error::ConfigError("store.write_timeout_ms must be > 0".to_string()));
        }
        if matches!(self.store.url.as_deref(), Some(url) if url.trim().is_empty()) {
            return Err(Error::ConfigError(
                "store.url must not be empty; omit it to run without a store".to_string(),
            ));
        }
        Ok(())
    }

    /// Merge environment variables into the configuration
    pub fn merge_env(&mut self) -> Result<()> {
        if let Ok(url) = env::var("REDIS_URL") {
            if !url.trim().is_empty() {
                self.store.url = Some(url);
            }
        }

        if let Ok(port) = env::var("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| Error::ConfigError(format!("Invalid PORT {:?}: {}", port, e)))?;
        }

        Ok(())
    }
}
