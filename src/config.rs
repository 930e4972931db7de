//! Configuration types for the task tracker.

use crate::error::{Result, TrackerError};
use crate::tasks::manager::DEFAULT_COOLDOWN_SECS;
use crate::tasks::scanner::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_TICK_INTERVAL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Task file location.
    pub store: StoreConfig,
    /// Due-task scanner settings.
    pub scanner: ScannerConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Notification delivery settings.
    pub notifier: NotifierConfig,
}

/// Task file configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the task file (None = `data_dir()/tasks.json`).
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// The configured path, or the default data location.
    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(crate::paths::tasks_file)
    }
}

/// Due-task scanner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Milliseconds between scans.
    pub tick_interval_ms: u64,
    /// Minimum seconds between two notifications for one task.
    pub cooldown_secs: u64,
    /// Capacity of the outbound notification channel.
    pub channel_capacity: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: u64::try_from(DEFAULT_TICK_INTERVAL.as_millis()).unwrap_or(1000),
            cooldown_secs: DEFAULT_COOLDOWN_SECS.unsigned_abs(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ScannerConfig {
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    #[must_use]
    pub fn cooldown(&self) -> chrono::TimeDelta {
        i64::try_from(self.cooldown_secs)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
            .unwrap_or(chrono::TimeDelta::MAX)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port (0 = auto-assign).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

/// Notification delivery configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Log every notification through tracing.
    pub log: bool,
    /// Optional webhook endpoint that receives each due task.
    pub webhook_url: Option<String>,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            log: true,
            webhook_url: None,
        }
    }
}

impl TrackerConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| TrackerError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TrackerError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `config_dir()/config.toml`.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        crate::paths::config_file()
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `TASKBELL_PORT` (or `PORT`) from the environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        let raw = std::env::var("TASKBELL_PORT").or_else(|_| std::env::var("PORT"));
        if let Ok(raw) = raw {
            self.server.port = raw
                .trim()
                .parse()
                .map_err(|e| TrackerError::Config(format!("invalid port '{raw}': {e}")))?;
        }
        Ok(())
    }
}
