//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/goldleaf/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/goldleaf/` (~/.config/goldleaf/)
//! - Data: `$XDG_DATA_HOME/goldleaf/` (~/.local/share/goldleaf/)
//! - State/Logs: `$XDG_STATE_HOME/goldleaf/` (~/.local/state/goldleaf/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Which storage backend serves the repository contract
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// On-device SQLite database
    #[default]
    Local,
    /// Companion goldleaf server over HTTP
    Remote,
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Storage backend, chosen once at startup
    #[serde(default)]
    pub backend: Backend,

    /// Remote server configuration (required when backend = "remote")
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    /// Server URL (e.g., `https://goldleaf.example.com`)
    pub server_url: Option<String>,

    /// API key (format: "gl_live_xxxx")
    pub api_key: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            api_key: None,
            timeout_secs: default_remote_timeout(),
        }
    }
}

fn default_remote_timeout() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
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

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field requirements
    pub fn validate(&self) -> Result<()> {
        if self.backend == Backend::Remote && self.remote.server_url.is_none() {
            return Err(Error::Config(
                "remote.server_url is required when backend = \"remote\"".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/goldleaf/config.toml` (~/.config/goldleaf/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("goldleaf").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/goldleaf/` (~/.local/share/goldleaf/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("goldleaf")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/goldleaf/` (~/.local/state/goldleaf/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("goldleaf")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/goldleaf/goldleaf.db` (~/.local/share/goldleaf/goldleaf.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("goldleaf.db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/goldleaf/goldleaf.log` (~/.local/state/goldleaf/goldleaf.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("goldleaf.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend, Backend::Local);
        assert!(config.remote.server_url.is_none());
        assert_eq!(config.remote.timeout_secs, 30);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
backend = "remote"

[remote]
server_url = "https://goldleaf.example.com"
api_key = "gl_live_xxxxxxxxxxxx"
timeout_secs = 10

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.backend, Backend::Remote);
        assert_eq!(
            config.remote.server_url.as_deref(),
            Some("https://goldleaf.example.com")
        );
        assert_eq!(config.remote.timeout_secs, 10);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_remote_backend_requires_server_url() {
        let toml = r#"backend = "remote""#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
