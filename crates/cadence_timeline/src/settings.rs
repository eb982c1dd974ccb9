// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine settings.
//!
//! Stored as RON. Covers:
//! - Frame rate and preview length for headless playback
//! - Loop behaviour
//! - Default log filter directive

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Environment variable naming a settings file
pub const SETTINGS_ENV_VAR: &str = "CADENCE_SETTINGS";

/// Engine and preview settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Settings format version
    pub version: u32,
    /// Frames per second
    pub frame_rate: f64,
    /// Wrap playback at the end of the timeline
    pub loop_playback: bool,
    /// Frames to play in a headless preview run
    pub preview_frames: i64,
    /// Default `tracing` filter directive
    pub log_directive: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            frame_rate: 30.0,
            loop_playback: false,
            preview_frames: 300,
            log_directive: "cadence_timeline=info".to_string(),
        }
    }
}

impl EngineSettings {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)?;
        let settings: EngineSettings =
            ron::from_str(&content).map_err(|e| EngineError::Project(e.to_string()))?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(EngineError::Project(format!(
                "Settings version {} is newer than supported version {}",
                settings.version, SETTINGS_FORMAT_VERSION
            )));
        }

        Ok(settings)
    }

    /// Load from the file named by `CADENCE_SETTINGS`, or defaults if unset
    pub fn load_from_env() -> Result<Self, EngineError> {
        match std::env::var_os(SETTINGS_ENV_VAR) {
            Some(path) => {
                let settings = Self::load(Path::new(&path))?;
                tracing::info!(path = ?path, "Loaded engine settings");
                Ok(settings)
            }
            None => Ok(Self::default()),
        }
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);

        let content = ron::ser::to_string_pretty(self, config).map_err(|e| EngineError::Project(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }
}
