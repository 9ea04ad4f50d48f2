//! Application settings
//!
//! Camera selection, detection threshold, and hold duration, persisted as
//! JSON under the platform config directory. Settings are passed by value
//! into each frame's detection call rather than read from shared state.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::spelling::DEFAULT_HOLD_FRAMES;

/// Default detection confidence threshold, tuned against the bundled
/// letter model
pub const DEFAULT_CONFIDENCE: f32 = 0.83;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Selected camera device index
    pub camera_index: u32,
    /// Minimum detection confidence in `[0, 1]`
    pub confidence_threshold: f32,
    /// Contiguous frames a sign must be held before it commits
    pub hold_frames: u32,
    /// Path to the ONNX letter-detection model
    pub model_path: PathBuf,
    /// Path of the spelled-words log
    pub history_path: PathBuf,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            camera_index: 0,
            confidence_threshold: DEFAULT_CONFIDENCE,
            hold_frames: DEFAULT_HOLD_FRAMES,
            model_path: PathBuf::from("models/asl_letters.onnx"),
            history_path: default_history_path(),
        }
    }
}

impl AppSettings {
    /// Load settings from the config directory, falling back to defaults if
    /// the file is missing or unreadable
    pub fn load() -> Self {
        let Some(path) = settings_path() else {
            log::warn!("No config directory available, using default settings");
            return Self::default();
        };

        let mut settings = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(settings) => {
                    log::info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    log::warn!("Failed to parse settings {:?}: {}, using defaults", path, e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::warn!("Failed to read settings {:?}: {}, using defaults", path, e);
                Self::default()
            }
        };

        settings.sanitize();
        settings
    }

    /// Save settings to the config directory
    pub fn save(&self) -> Result<()> {
        let path = settings_path().context("no config directory available")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).with_context(|| format!("writing settings {:?}", path))?;
        log::info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Clamp fields to their valid ranges
    pub fn sanitize(&mut self) {
        self.confidence_threshold = self.confidence_threshold.clamp(0.0, 1.0);
        self.hold_frames = self.hold_frames.max(1);
    }
}

/// Settings file location under the platform config dir
fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sign-speller").join("settings.json"))
}

/// Default spelled-words log location: the platform data dir, or a local
/// `words/` directory when none is available
fn default_history_path() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join("sign-speller").join("spelled_words.txt"),
        None => PathBuf::from("words").join("spelled_words.txt"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let mut settings = AppSettings::default();
        settings.camera_index = 2;
        settings.confidence_threshold = 0.5;
        settings.hold_frames = 15;

        let json = serde_json::to_string(&settings).unwrap();
        let parsed: AppSettings = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.camera_index, 2);
        assert_eq!(parsed.confidence_threshold, 0.5);
        assert_eq!(parsed.hold_frames, 15);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let parsed: AppSettings = serde_json::from_str(r#"{"camera_index": 1}"#).unwrap();
        assert_eq!(parsed.camera_index, 1);
        assert_eq!(parsed.confidence_threshold, DEFAULT_CONFIDENCE);
        assert_eq!(parsed.hold_frames, DEFAULT_HOLD_FRAMES);
    }

    #[test]
    fn test_sanitize_clamps_ranges() {
        let mut settings = AppSettings::default();
        settings.confidence_threshold = 1.7;
        settings.hold_frames = 0;
        settings.sanitize();
        assert_eq!(settings.confidence_threshold, 1.0);
        assert_eq!(settings.hold_frames, 1);

        settings.confidence_threshold = -0.3;
        settings.sanitize();
        assert_eq!(settings.confidence_threshold, 0.0);
    }
}
