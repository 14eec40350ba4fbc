#![deny(unsafe_code)]

//! Configuration loading and validation for strokectl.
//!
//! Loads TOML configuration files and validates them against expected schemas.
//! Provides the [`ClientConfig`] type for client-side settings (socket path,
//! timeout, logging), and the [`records`] module for the structured connection
//! and certificate-authority records that get encoded into stroke messages.
//!
//! Parsing the legacy `ipsec.conf` text format is explicitly not done here;
//! records arrive as structured TOML.

/// Connection, CA, and global setup records.
pub mod records;

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level client configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Daemon connection settings.
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where and how to reach the control daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Path to the daemon's control socket.
    #[serde(default = "default_socket_path")]
    pub socket_path: String,

    /// Optional I/O timeout in seconds. When unset, a hung daemon blocks
    /// the caller indefinitely.
    #[serde(default)]
    pub io_timeout_secs: Option<u64>,

    /// Verbosity level stamped into every stroke message. `-1` keeps the
    /// daemon silent on its own side, matching non-interactive use.
    #[serde(default = "default_verbosity")]
    pub verbosity: i32,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            io_timeout_secs: None,
            verbosity: default_verbosity(),
        }
    }
}

fn default_socket_path() -> String {
    "/var/run/charon.ctl".to_string()
}

fn default_verbosity() -> i32 {
    -1
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ClientConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: ClientConfig = toml::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded client config");
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.daemon.socket_path.is_empty() {
            return Err(ConfigError::Validation(
                "daemon.socket_path must not be empty".to_string(),
            ));
        }
        if let Some(0) = self.daemon.io_timeout_secs {
            return Err(ConfigError::Validation(
                "daemon.io_timeout_secs must be non-zero when set".to_string(),
            ));
        }
        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {:?}, got {:?}",
                valid_levels, self.logging.level
            )));
        }
        Ok(())
    }
}
