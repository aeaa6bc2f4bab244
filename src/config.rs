//! Tunable timeline parameters.
//!
//! All fields have defaults, so a config file only needs the keys it changes.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Scroll rate, pixels per millisecond of playback
    pub speed: f32,
    /// Largest |target − sung| pitch distance that still counts as a hit (semitones)
    pub tolerance: i32,
    /// Width of one feedback region in milliseconds
    pub lookahead_ms: i64,
    /// How long a score stays on screen after a sentence change
    pub score_hide_delay_ms: u64,
    /// Duration of the indicator's fall back to the lowest pitch
    pub indicator_anim_ms: u64,
    /// Semitones added above and below the observed pitch range
    pub pitch_padding: i32,
    /// Icon resource the renderer uses for the indicator
    pub indicator_icon: String,
    pub indicator_width_dp: f32,
    pub indicator_height_dp: f32,
    /// Distance of the "now" line from the left edge
    pub baseline_dp: f32,
    pub bar_height_dp: f32,
    pub score_offset_dp: f32,
    pub score_top_dp: f32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            speed: 0.25,
            tolerance: 2,
            lookahead_ms: 120,
            score_hide_delay_ms: 2000,
            indicator_anim_ms: 3000,
            pitch_padding: 5,
            indicator_icon: "ic_midi_triangle_arrow".to_string(),
            indicator_width_dp: 8.0,
            indicator_height_dp: 8.0,
            baseline_dp: 82.0,
            bar_height_dp: 5.0,
            score_offset_dp: 10.0,
            score_top_dp: 30.0,
        }
    }
}

impl TimelineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = serde_json::from_str(&data)?;
        info!("Loaded timeline config from {:?}", path);
        Ok(config)
    }

    /// Load from `path`, falling back to defaults if it is absent or malformed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(c) => c,
            Err(e) => {
                warn!("{}; using default timeline config", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        info!("Timeline config saved to {:?}", path);
        Ok(())
    }
}
