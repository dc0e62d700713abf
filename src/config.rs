use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::service::AutoPlaylist;

const CONFIG_FILE_NAME: &str = "config.toml";
/// Longest accepted sync interval (one week)
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub store: StoreConfig,
    pub source: SourceConfig,
    pub logging: LoggingConfig,
}

/// Sync scheduling and scope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Minutes between syncs. 0 or less disables periodic sync.
    pub interval_minutes: f64,
    /// Identity passed to the remote source
    pub user: String,
    /// Ids of auto playlists that must never be cached
    pub auto_playlists: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 30.0,
            user: "default".to_string(),
            auto_playlists: Vec::new(),
        }
    }
}

impl SyncConfig {
    /// Interval after normalisation: non-positive disables, anything under a
    /// minute becomes one minute, everything else rounds up to whole minutes
    /// and is capped at `MAX_INTERVAL_MINUTES`.
    pub fn interval(&self) -> Option<Duration> {
        normalize_interval_minutes(self.interval_minutes).map(|m| Duration::from_secs(m * 60))
    }

    pub fn auto_playlists(&self) -> Vec<AutoPlaylist> {
        self.auto_playlists.iter().map(AutoPlaylist::new).collect()
    }
}

/// Clamp a user-entered interval to whole minutes. `None` means disabled.
pub fn normalize_interval_minutes(minutes: f64) -> Option<u64> {
    if minutes.is_nan() || minutes <= 0.0 {
        None
    } else if minutes < 1.0 {
        Some(1)
    } else if minutes >= MAX_INTERVAL_MINUTES as f64 {
        Some(MAX_INTERVAL_MINUTES)
    } else {
        Some(minutes.ceil() as u64)
    }
}

/// Where the cache is persisted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// redb file path (empty = default data dir)
    pub path: Option<PathBuf>,
}

/// Remote source settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// JSON snapshot of the remote library
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing filter directive, overridden by RUST_LOG
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("splaylist-cache");

        Ok(config_dir.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default path, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, or write and return defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;

            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;

            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Generate example config content for documentation
    pub fn example_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
