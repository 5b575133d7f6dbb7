use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ErrorCode;
use crate::notify::DEFAULT_DURATION_MS;
use crate::store::{MAX_SAVED_RESULTS, STORAGE_KEY};

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "KOLBUDGET_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BudgetConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Explicit data directory. Falls back to the env override, then the
    /// platform data dir.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_key")]
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: None,
            key: default_key(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_duration_ms(),
        }
    }
}

impl NotificationConfig {
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl BudgetConfig {
    /// Data directory after applying overrides: config value, then
    /// `KOLBUDGET_DATA_DIR`, then `<platform data dir>/kolbudget`.
    #[must_use]
    pub fn data_dir(&self) -> Option<PathBuf> {
        resolve_data_dir(
            self.storage.dir.clone(),
            env::var_os(DATA_DIR_ENV).map(PathBuf::from),
            dirs::data_dir(),
        )
    }
}

fn resolve_data_dir(
    configured: Option<PathBuf>,
    env_dir: Option<PathBuf>,
    platform: Option<PathBuf>,
) -> Option<PathBuf> {
    configured
        .or(env_dir)
        .or_else(|| platform.map(|dir| dir.join("kolbudget")))
}

/// Parse a config file. A missing file yields defaults.
///
/// # Errors
///
/// Fails if the file exists but cannot be read or parsed.
pub fn load_config_from(path: &Path) -> Result<BudgetConfig> {
    if !path.exists() {
        return Ok(BudgetConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<BudgetConfig>(&content).with_context(|| {
        let code = ErrorCode::ConfigParseError;
        format!(
            "{code}: Failed to parse {} ({})",
            path.display(),
            code.hint().unwrap_or(code.message())
        )
    })
}

/// Load `<config dir>/kolbudget/config.toml`, or defaults when there is no
/// config directory or file.
///
/// # Errors
///
/// Fails if the file exists but cannot be read or parsed.
pub fn load_config() -> Result<BudgetConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(BudgetConfig::default());
    };
    load_config_from(&config_dir.join("kolbudget/config.toml"))
}

fn default_key() -> String {
    STORAGE_KEY.to_string()
}

const fn default_capacity() -> usize {
    MAX_SAVED_RESULTS
}

const fn default_duration_ms() -> u64 {
    DEFAULT_DURATION_MS
}
