// SPDX-License-Identifier: GPL-3.0-only

//! Scanner configuration
//!
//! Stored as JSON under the user's config directory. Every section falls
//! back to its defaults when a key is missing, so older files keep loading.

use crate::constants::{SnapshotQuality, decoder, focus, snapshot};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Directory name under the platform config directory
const CONFIG_DIR_NAME: &str = "qr-scanner";
/// File name of the persisted configuration
const CONFIG_FILE_NAME: &str = "config.json";

/// Frame decoder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderSettings {
    /// Frames are downscaled so their longest edge is at most this (0 = never)
    pub max_dimension: u32,
    /// Retry at full resolution when the downscaled pass finds nothing
    pub try_harder: bool,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            max_dimension: decoder::DEFAULT_MAX_DIMENSION,
            try_harder: true,
        }
    }
}

/// Autofocus timing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusTimingSettings {
    /// Driver loop tick in milliseconds
    pub tick_ms: u64,
    /// Sweep suppression window after a detection, in milliseconds
    pub detection_window_ms: u64,
    /// How long `stop()` waits for the driver thread, in milliseconds
    pub stop_timeout_ms: u64,
}

impl Default for FocusTimingSettings {
    fn default() -> Self {
        Self {
            tick_ms: focus::SWEEP_TICK.as_millis() as u64,
            detection_window_ms: focus::DETECTION_WINDOW.as_millis() as u64,
            stop_timeout_ms: focus::STOP_TIMEOUT.as_millis() as u64,
        }
    }
}

impl FocusTimingSettings {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn detection_window(&self) -> Duration {
        Duration::from_millis(self.detection_window_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

/// Snapshot settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotSettings {
    /// Output directory (None = pictures directory, else current directory)
    pub directory: Option<PathBuf>,
    /// JPEG quality preset
    pub quality: SnapshotQuality,
    /// File name stem, a timestamp is appended
    pub file_stem: String,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            directory: None,
            quality: SnapshotQuality::default(),
            file_stem: snapshot::DEFAULT_FILE_STEM.to_string(),
        }
    }
}

impl SnapshotSettings {
    /// Directory snapshots are written to
    pub fn output_dir(&self) -> PathBuf {
        self.directory
            .clone()
            .or_else(dirs::picture_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Frame decoder settings
    pub decoder: DecoderSettings,
    /// Autofocus timing
    pub focus: FocusTimingSettings,
    /// Snapshot output
    pub snapshot: SnapshotSettings,
}

impl Config {
    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load configuration from a JSON file
    ///
    /// A missing file yields the defaults; a file that exists but does not
    /// parse is an error.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load from the default location, falling back to defaults
    pub fn load_default() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Save configuration as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }
}
