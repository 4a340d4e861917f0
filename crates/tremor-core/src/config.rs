//! Player configuration persistence
//!
//! Operator choices live in a single YAML file at `~/.tremor/config.yaml`.
//! Loading is infallible: a missing or unreadable file yields defaults so
//! the player always starts, and parse failures are logged rather than
//! surfaced.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::audio::AudioConfig;

/// Nominal audification rate assumed when the operator has not set one
///
/// Audified datasets are usually rendered for 44.1 kHz playback; the
/// ratio of this rate to the hardware rate scales every speed command.
pub const DEFAULT_NOMINAL_SAMPLE_RATE: u32 = 44_100;

/// Persisted player settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Sample rate the audified dataset was rendered for
    pub nominal_sample_rate: u32,
    /// Start playback automatically when the operator clicks to seek
    pub play_on_seek: bool,
    /// Output volume restored at startup, clamped to [0, 1] on use
    pub volume: f32,
    /// Output device and buffer settings
    pub audio: AudioConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            nominal_sample_rate: DEFAULT_NOMINAL_SAMPLE_RATE,
            play_on_seek: true,
            volume: 1.0,
            audio: AudioConfig::default(),
        }
    }
}

/// Default configuration path: `~/.tremor/config.yaml`
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tremor")
        .join("config.yaml")
}

/// Load a configuration file, falling back to defaults
///
/// Returns `T::default()` when the file is missing, unreadable, or does
/// not parse. Parse failures are logged so a hand-edited file that went
/// wrong is visible without blocking startup.
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        return T::default();
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("load_config: cannot parse {}: {e}", path.display());
                T::default()
            }
        },
        Err(e) => {
            log::warn!("load_config: cannot read {}: {e}", path.display());
            T::default()
        }
    }
}

/// Save a configuration file, creating parent directories as needed
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
    fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;

    Ok(())
}
