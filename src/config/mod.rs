//! Configuration schema definitions and loading.
//!
//! Defines the complete configuration structure for Chime: general settings,
//! the single playback track, and the notification surface. All
//! configurations are serializable to/from TOML format and every field has a
//! default, so a missing config file is not an error.

mod general;
mod notification;
mod paths;
mod track;

#[cfg(test)]
mod tests;

pub use general::GeneralConfig;
pub use notification::NotificationConfig;
pub use paths::ConfigPaths;
pub use track::TrackConfig;

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{ChimeError, Result};

/// Main configuration structure for Chime.
///
/// Represents the complete configuration schema that can be loaded
/// from TOML files. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// General application settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// The single playback item.
    #[serde(default)]
    pub track: TrackConfig,

    /// Notification surface settings.
    #[serde(default)]
    pub notification: NotificationConfig,
}

impl Config {
    /// Loads configuration from the main config file.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = ConfigPaths::main_config()?;
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Loads configuration from an explicit path.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| ChimeError::IoError {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;

        Self::from_toml_str(&contents, Some(path))
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    /// Returns error if the string is not valid TOML for this schema.
    pub fn from_toml_str(contents: &str, path: Option<&Path>) -> Result<Self> {
        toml::from_str(contents).map_err(|e| ChimeError::toml_parse(e, path))
    }
}
