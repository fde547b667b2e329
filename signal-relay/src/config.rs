//! Configuration loading for signal-relay.
//!
//! Configuration is loaded from a TOML file (default: `signal.toml`);
//! a missing file falls back to defaults. The `PORT` environment
//! variable overrides the bind-address port so the relay drops into
//! PaaS-style deployments unchanged.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration for signal-relay.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Keepalive broadcaster configuration.
    #[serde(default)]
    pub keepalive: KeepaliveConfig,
    /// Idle-call cleanup configuration.
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the WebSocket listener (default: 0.0.0.0:3000).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Keepalive broadcaster configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct KeepaliveConfig {
    /// Ping interval in seconds (default: 5).
    #[serde(default = "default_keepalive_interval")]
    pub interval_secs: u64,
    /// Enable the keepalive task (default: true).
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Idle-call cleanup configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    /// Sweep interval in seconds (default: 60).
    #[serde(default = "default_cleanup_interval")]
    pub interval_secs: u64,
    /// Calls idle longer than this are removed (default: 3600 = 1 hour).
    #[serde(default = "default_max_idle")]
    pub max_idle_secs: u64,
    /// Enable the cleanup task (default: true).
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_keepalive_interval() -> u64 {
    5
}

fn default_cleanup_interval() -> u64 {
    60
}

fn default_max_idle() -> u64 {
    3600 // 1 hour
}

fn default_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_keepalive_interval(),
            enabled: default_enabled(),
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_cleanup_interval(),
            max_idle_secs: default_max_idle(),
            enabled: default_enabled(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::info!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Apply environment overrides (currently just `PORT`).
    pub fn apply_env(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            match override_port(&self.server.bind_address, &port) {
                Some(addr) => self.server.bind_address = addr,
                None => tracing::warn!("Ignoring invalid PORT value: {port:?}"),
            }
        }
    }
}

/// Replace the port of `host:port` bind address with `port`.
///
/// Returns `None` when either the address or the port is malformed.
fn override_port(bind_address: &str, port: &str) -> Option<String> {
    let port: u16 = port.trim().parse().ok()?;
    let (host, _) = bind_address.rsplit_once(':')?;
    Some(format!("{host}:{port}"))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
