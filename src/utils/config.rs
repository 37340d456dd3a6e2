//! Configuration management for tubeplayer
//!
//! This module handles loading and managing application configuration
//! from config files and environment variables.

use crate::player::PlayerConfig;
use crate::utils::error::{IntoPlayerError, PlayerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Public endpoint of the platform data API
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Player controller configuration
    pub player: PlayerConfig,

    /// Video catalog configuration
    pub catalog: CatalogConfig,

    /// General application settings
    pub general: GeneralConfig,
}

/// Catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// JSON file holding a `videos.list` response or a plain video array
    pub path: Option<PathBuf>,

    /// Channel whose uploads are listed
    pub channel_id: String,

    /// Platform API key; without one the static catalog is used
    pub api_key: Option<String>,

    /// Base URL of the platform data API
    pub api_base_url: String,

    /// Page size for list and search calls
    pub max_results: u32,

    /// Seconds between live status checks
    pub live_refresh_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: None,
            channel_id: String::new(),
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            max_results: 20,
            live_refresh_secs: 30,
        }
    }
}

impl CatalogConfig {
    /// True when no API key is configured and only the static catalog is served
    pub fn use_static_data(&self) -> bool {
        self.api_key.as_deref().map_or(true, |key| key.trim().is_empty())
    }

    pub fn live_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.live_refresh_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.live_refresh_secs == 0 {
            return Err(PlayerError::Config(
                "live_refresh_secs must be greater than zero".to_string(),
            ));
        }
        if !(1..=50).contains(&self.max_results) {
            return Err(PlayerError::Config(format!(
                "max_results must be between 1 and 50, got {}",
                self.max_results
            )));
        }
        if !self.use_static_data() && self.channel_id.trim().is_empty() {
            return Err(PlayerError::Config(
                "channel_id is required when an API key is set".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. System config file (/etc/tubeplayer/config.toml on Linux)
    /// 3. User config file (~/.config/tubeplayer/config.toml on Linux)
    /// 4. Environment variables (TUBEPLAYER_* prefix)
    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    /// Load configuration, reading `explicit` after the user config file
    pub fn load_with(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(system_path) = Self::system_config_path() {
            if system_path.exists() {
                config.merge_from_file(&system_path)?;
            }
        }

        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                config.merge_from_file(&user_path)?;
            }
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(PlayerError::NotFound(format!(
                    "config file {}",
                    path.display()
                )));
            }
            config.merge_from_file(path)?;
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to user config file
    pub fn save(&self) -> Result<()> {
        let path = Self::user_config_path()
            .ok_or_else(|| PlayerError::Config("Cannot determine user config path".to_string()))?;
        self.save_to(&path)
    }

    /// Save configuration to an arbitrary path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).config_err("Failed to create config directory")?;
        }

        let toml = toml::to_string_pretty(self).config_err("Failed to serialize config")?;
        std::fs::write(path, toml).config_err("Failed to write config file")?;

        Ok(())
    }

    /// Merge configuration from a TOML file
    ///
    /// Keys present in the file replace the current values. Sections and keys
    /// absent from the file keep whatever earlier sources set.
    fn merge_from_file(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path).config_err("Failed to read config file")?;
        let overlay: toml::Value =
            toml::from_str(&contents).config_err("Failed to parse config file")?;

        let mut merged = toml::Value::try_from(&*self).config_err("Failed to serialize config")?;
        merge_values(&mut merged, overlay);
        *self = merged
            .try_into()
            .config_err(&format!("Invalid values in {}", path.display()))?;

        log::debug!("Loaded configuration from {}", path.display());
        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(interval) = std::env::var("TUBEPLAYER_POLL_INTERVAL_MS") {
            self.player.poll_interval_ms = interval
                .parse()
                .map_err(|_| PlayerError::Config("Invalid TUBEPLAYER_POLL_INTERVAL_MS".to_string()))?;
        }

        if let Ok(timeout) = std::env::var("TUBEPLAYER_SDK_LOAD_TIMEOUT_MS") {
            let timeout: u64 = timeout.parse().map_err(|_| {
                PlayerError::Config("Invalid TUBEPLAYER_SDK_LOAD_TIMEOUT_MS".to_string())
            })?;
            self.player.sdk_load_timeout_ms = (timeout > 0).then_some(timeout);
        }

        if let Ok(container) = std::env::var("TUBEPLAYER_CONTAINER_ID") {
            self.player.container_id = container;
        }

        if let Ok(path) = std::env::var("TUBEPLAYER_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(path));
        }

        if let Ok(channel) = std::env::var("TUBEPLAYER_CHANNEL_ID") {
            self.catalog.channel_id = channel;
        }

        if let Ok(key) = std::env::var("TUBEPLAYER_API_KEY") {
            self.catalog.api_key = (!key.trim().is_empty()).then_some(key);
        }

        if let Ok(log_level) = std::env::var("TUBEPLAYER_LOG_LEVEL") {
            self.general.log_level = log_level;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.player.validate()?;
        self.catalog.validate()?;

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.general.log_level.as_str()) {
            return Err(PlayerError::Config(format!(
                "Invalid log level '{}', must be one of: {:?}",
                self.general.log_level, valid_log_levels
            )));
        }

        Ok(())
    }

    /// Get system config file path
    fn system_config_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        return Some(PathBuf::from("/etc/tubeplayer/config.toml"));

        #[cfg(target_os = "windows")]
        return std::env::var("PROGRAMDATA")
            .ok()
            .map(|p| PathBuf::from(p).join("tubeplayer").join("config.toml"));

        #[cfg(target_os = "macos")]
        return Some(PathBuf::from(
            "/Library/Application Support/tubeplayer/config.toml",
        ));

        #[allow(unreachable_code)]
        None
    }

    /// Get user config file path
    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tubeplayer").join("config.toml"))
    }
}

/// Recursively lay `overlay` over `base`, table by table
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
