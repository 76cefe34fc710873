use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{UserContext, ValidationError, WeekStart};
use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Owner of everything this installation records, unless `--user` is given
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Reject a second open entry at the storage level, closing the window
    /// between the "is a timer running" check and the insert
    #[serde(default = "default_enforce_single_active")]
    pub enforce_single_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportsConfig {
    #[serde(default)]
    pub week_start: WeekStart,
    #[serde(default = "default_top_tasks")]
    pub top_tasks: usize,
    #[serde(default = "default_recent_entries")]
    pub recent_entries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            user_id: None,
            log_level: default_log_level(),
            timer: TimerConfig::default(),
            reports: ReportsConfig::default(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            enforce_single_active: default_enforce_single_active(),
        }
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            week_start: WeekStart::default(),
            top_tasks: default_top_tasks(),
            recent_entries: default_recent_entries(),
        }
    }
}

// Default value functions
fn default_database_path() -> String {
    // Fallback only; the profile decides the real path at load time
    if let Some(data_dir) = utils::get_data_dir(utils::Profile::Prod) {
        data_dir.join("taskclock.db").to_string_lossy().to_string()
    } else {
        "~/.local/share/taskclock/taskclock.db".to_string()
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_enforce_single_active() -> bool {
    true
}

fn default_top_tasks() -> usize {
    5
}

fn default_recent_entries() -> usize {
    10
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("No user configured: pass --user or set user_id in the config file")]
    NoUser,
    #[error("Invalid user: {0}")]
    InvalidUser(#[from] ValidationError),
}

impl Config {
    /// Load configuration from file, or create default if missing
    /// Uses the provided profile to determine config and database paths
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        let mut config = Self::load_or_create(&config_path)?;

        // Keep the database with its profile even if the file was edited
        config.database_path = Self::default_database_path_for_profile(profile);
        Ok(config)
    }

    /// Load configuration from an explicit file path, creating it with
    /// defaults if it does not exist yet
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        Self::load_or_create(path)
    }

    fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            let mut config = Config::default();
            if let Err(e) = config.save_to_path(path) {
                tracing::error!("failed to save config file {}: {}", path.display(), e);
                return Err(e);
            }
            Ok(config)
        }
    }

    pub fn save_to_path(&mut self, path: &Path) -> Result<(), ConfigError> {
        // Ensure config version is set before saving
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile).ok_or_else(|| {
            ConfigError::ConfigDirError("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get default database path for a specific profile
    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("taskclock.db").to_string_lossy().to_string()
        } else {
            match profile {
                utils::Profile::Dev => "~/.local/share/taskclock-dev/taskclock.db".to_string(),
                utils::Profile::Prod => "~/.local/share/taskclock/taskclock.db".to_string(),
            }
        }
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    /// Pick the acting user: the explicit override, then `user_id` from the
    /// file, then the login name from the environment. A blank override or
    /// configured id is rejected rather than skipped.
    pub fn resolve_user(&self, override_user: Option<&str>) -> Result<UserContext, ConfigError> {
        if let Some(id) = override_user.map(str::to_string).or_else(|| self.user_id.clone()) {
            return Ok(UserContext::new(id)?);
        }
        std::env::var("USER")
            .ok()
            .or_else(|| std::env::var("USERNAME").ok())
            .and_then(|id| UserContext::new(id).ok())
            .ok_or(ConfigError::NoUser)
    }
}
