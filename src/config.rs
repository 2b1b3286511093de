//! Driver configuration using Figment
//!
//! Configuration is loaded from (in order of precedence):
//! 1. Environment variables prefixed with `NF8743_` (nested keys split on `__`)
//! 2. TOML configuration file (default: `newfocus8743.toml`, optional)
//! 3. Built-in defaults
//!
//! # Environment Variable Overrides
//!
//! ```text
//! NF8743_CONNECTION__HOST=192.168.1.101
//! NF8743_CONNECTION__PORT=23
//! NF8743_CONNECTION__READ_TIMEOUT_MS=500
//! NF8743_LOGGING__LEVEL=debug
//! ```
//!
//! # Example
//!
//! ```no_run
//! use newfocus8743::config::DriverConfig;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = DriverConfig::load()?;
//! println!("Controller at {}:{}", config.connection.host, config.connection.port);
//! # Ok(())
//! # }
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default configuration file looked up by [`DriverConfig::load`].
pub const DEFAULT_CONFIG_FILE: &str = "newfocus8743.toml";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "NF8743_";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A provider failed to parse or extract
    #[error("Configuration load error: {0}")]
    LoadError(#[from] figment::Error),
    /// Values parsed but violate a constraint
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

/// Top-level driver configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Controller connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings for one controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Hostname or IP address of the controller
    #[serde(default)]
    pub host: String,
    /// TCP port (the controller's telnet port)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Number of preamble bytes drained right after the stream opens
    #[serde(default = "default_handshake_bytes")]
    pub handshake_bytes: usize,
    /// Reply timeout in milliseconds (0 = wait forever)
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
    /// Connect timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    #[serde(default)]
    pub json: bool,
}

fn default_port() -> u16 {
    23
}

fn default_handshake_bytes() -> usize {
    6
}

fn default_read_timeout() -> u64 {
    2000
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            handshake_bytes: default_handshake_bytes(),
            read_timeout_ms: default_read_timeout(),
            connect_timeout_ms: default_connect_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl ConnectionConfig {
    /// Connection settings for `host` with every other field at its default.
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Reply timeout, `None` when disabled.
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    /// Connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// `host:port` string used in logs and errors.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DriverConfig {
    /// Load configuration from the default file (if present) and environment.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::load_unvalidated(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit TOML file plus environment.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load_unvalidated(Some(path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Merge defaults, file and environment without validating.
    ///
    /// For callers that apply their own overrides (e.g. command-line flags)
    /// before calling [`DriverConfig::validate`].
    pub fn load_unvalidated(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::ValidationError(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            Some(path) => Toml::file(path),
            None => Toml::file(DEFAULT_CONFIG_FILE),
        };

        let config: DriverConfig = Figment::from(Serialized::defaults(DriverConfig::default()))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    /// Validate semantic constraints that parsing alone cannot catch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "connection.host must not be empty".to_string(),
            ));
        }
        if self.connection.port == 0 {
            return Err(ConfigError::ValidationError(
                "connection.port must be non-zero".to_string(),
            ));
        }
        let level = self.logging.level.to_lowercase();
        if !matches!(
            level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level '{}' (expected trace, debug, info, warn or error)",
                self.logging.level
            )));
        }
        Ok(())
    }
}
