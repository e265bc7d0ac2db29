//! Player configuration with JSON persistence.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Decoder binary selection.
///
/// The preferred binary is probed on `$PATH` at process start; the fallback
/// is used when it is absent. Both must speak the same stdin command
/// protocol (`LOAD`/`PAUSE`), they only differ in buffering behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DecoderConfig {
    pub preferred: String,
    pub fallback: String,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            preferred: "mpg123".to_string(),
            fallback: "splay".to_string(),
        }
    }
}

/// External mixer command used to apply the logical volume.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MixerConfig {
    pub program: String,
    pub control: String,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            program: "amixer".to_string(),
            control: "Master".to_string(),
        }
    }
}

/// Top-level controller configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlayerConfig {
    pub decoder: DecoderConfig,
    pub mixer: MixerConfig,
    /// Equalizer profile path handed to the decoder environment. `None`
    /// disables equalizer file management entirely.
    pub equalizer_path: Option<PathBuf>,
}

impl PlayerConfig {
    /// Default on-disk location of the config file.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "chime").map(|dirs| dirs.config_dir().join("player.json"))
    }

    /// Load the configuration from the default location.
    ///
    /// A missing or unreadable file falls back to defaults; this never
    /// fails, so the appliance always comes up with a usable config.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            warn!("No config directory available, using default config");
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                if path.exists() {
                    warn!("Failed to read {}: {e}, using defaults", path.display());
                }
                Self::default()
            }
        }
    }

    /// Load the configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Best-effort write of the configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::default_path() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
