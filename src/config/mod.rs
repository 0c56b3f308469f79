//! Configuration management for dbutils
//!
//! Application settings come from several sources:
//! - Configuration file (TOML format)
//! - Environment variables
//! - Command-line arguments
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values
//!
//! The engine configurations ([`UpsertConfig`], [`ExportConfig`]) live in
//! [`engine`] and are built once from the command line.

pub mod engine;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

pub use engine::{ExportConfig, FileType, OutputMode, UpsertConfig};

/// Environment variable holding the MongoDB connection URI.
pub const URI_ENV_VAR: &str = "DBUTILS_URI";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Connection configuration
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// MongoDB connection URI
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Connection and server selection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Application name reported to the server
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn default_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_app_name() -> String {
    "dbutils".to_string()
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    true
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            timeout: default_timeout(),
            app_name: default_app_name(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Load configuration from a file
    ///
    /// An explicitly requested file must exist. When no path is given the
    /// default location is used if present, otherwise defaults apply.
    ///
    /// # Arguments
    /// * `path` - Optional explicit configuration file path
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_config_path(), false),
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigError::FileNotFound(path.display().to_string()).into());
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        self.apply_uri_override(std::env::var(URI_ENV_VAR).ok());
    }

    /// Replace the connection URI when a non-blank value is given
    pub fn apply_uri_override(&mut self, uri: Option<String>) {
        if let Some(uri) = uri.filter(|u| !u.trim().is_empty()) {
            self.connection.uri = uri;
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".dbutils")
            .join("config.toml")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.connection.validate_uri()?;

        if self.connection.timeout == 0 {
            return Err(ConfigError::InvalidValue {
                field: "connection.timeout".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Get connection timeout as Duration
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection.timeout)
    }
}

impl ConnectionConfig {
    /// Check that the URI is non-empty and uses a MongoDB scheme
    pub fn validate_uri(&self) -> Result<()> {
        let uri = self.uri.trim();
        if uri.is_empty() {
            return Err(ConfigError::MissingField("connection.uri".to_string()).into());
        }
        if !uri.starts_with("mongodb://") && !uri.starts_with("mongodb+srv://") {
            return Err(ConfigError::InvalidValue {
                field: "connection.uri".to_string(),
                value: uri.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}
