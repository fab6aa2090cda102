use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{IrrigatorError, Result};
use crate::irrigation::{Humidity, Thresholds};
use crate::locations::{default_locations, Location};

const APP_DIR: &str = "irrigator";
const SETTINGS_FILE: &str = "settings.json";
const LOG_FILE: &str = "irrigator.log";

/// Persisted between runs. Every field has a default, so a partial file is fine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Last selected location name.
    pub location: Option<String>,
    pub humidity: Humidity,
    pub thresholds: Thresholds,
    pub locations: Vec<Location>,
    pub refresh_minutes: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            location: None,
            humidity: Humidity::default(),
            thresholds: Thresholds::default(),
            locations: default_locations(),
            refresh_minutes: 60,
        }
    }
}

impl Settings {
    /// Time between forecast refreshes; `minutes` is at least one and saturates.
    pub fn refresh_interval(minutes: u64) -> Duration {
        Duration::from_secs(minutes.max(1).saturating_mul(60))
    }

    /// Read settings from `path`, or defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        let mut settings: Self = serde_json::from_str(&data)?;
        if settings.locations.is_empty() {
            settings.locations = default_locations();
        }
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!(path = %path.display(), "settings saved");
        Ok(())
    }
}

/// `~/.config/irrigator`
pub fn config_dir() -> Result<PathBuf> {
    let home = home::home_dir().ok_or(IrrigatorError::HomeNotFound)?;
    Ok(home.join(".config").join(APP_DIR))
}

pub fn default_settings_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(SETTINGS_FILE))
}

pub fn default_log_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(LOG_FILE))
}
