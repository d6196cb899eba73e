//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/scorecast/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/scorecast/` (~/.config/scorecast/)
//! - State/Logs: `$XDG_STATE_HOME/scorecast/` (~/.local/state/scorecast/)

use crate::error::{Error, Result};
use crate::types::{SessionDefinition, SessionMode};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

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

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Game source (chess.com API) configuration
    #[serde(default)]
    pub source: SourceConfig,

    /// Polling configuration
    #[serde(default)]
    pub polling: PollingConfig,

    /// Default session definition
    #[serde(default)]
    pub session: SessionConfig,

    /// Overlay display configuration
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Game source configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Base URL of the published-data API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_source_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.chess.com".to_string()
}

fn default_source_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("scorecast/{}", env!("CARGO_PKG_VERSION"))
}

/// Polling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    /// Seconds between poll ticks
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn default_poll_interval() -> u64 {
    30
}

/// Default session selection
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SessionConfig {
    /// Session mode (`titled-tuesday` or `custom`)
    #[serde(default)]
    pub mode: SessionMode,

    /// Session start (seconds since epoch), custom mode only
    pub start: Option<i64>,
}

impl SessionConfig {
    /// Build the session definition this configuration describes
    pub fn definition(&self) -> SessionDefinition {
        SessionDefinition::from_mode(self.mode, self.start)
    }
}

/// Overlay display configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    /// Number of round slots shown in the round strip
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
        }
    }
}

fn default_max_rounds() -> usize {
    11
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Daily log files kept before the oldest is deleted
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    7
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
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.source.base_url.trim().is_empty() {
            return Err(Error::Config("source.base_url must not be empty".to_string()));
        }
        if self.polling.interval_secs == 0 {
            return Err(Error::Config(
                "polling.interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.display.max_rounds == 0 {
            return Err(Error::Config(
                "display.max_rounds must be greater than zero".to_string(),
            ));
        }
        if self.logging.max_files == 0 {
            return Err(Error::Config(
                "logging.max_files must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/scorecast/config.toml` (~/.config/scorecast/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("scorecast").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/scorecast/` (~/.local/state/scorecast/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("scorecast")
    }

    /// Directory holding the daily log files
    pub fn log_dir() -> PathBuf {
        Self::state_dir()
    }
}
