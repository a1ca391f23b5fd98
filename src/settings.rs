//! Player preferences
//!
//! Stored separately from progress as a small JSON document.

use serde::{Deserialize, Serialize};

/// Player preferences that influence the simulation's side effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Silence everything
    pub muted: bool,

    // === Camera ===
    /// Per-frame (60 Hz) easing factor for the follow camera
    pub camera_smoothing: f32,

    // === Accessibility ===
    /// Reduced motion (no damage/boss flicker)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,

            camera_smoothing: 0.08,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Storage key used by hosts that persist settings
    pub const STORAGE_KEY: &'static str = "appleAdventure3DSettings";

    /// Parse settings, falling back to defaults on anything unreadable
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Settings>(json) {
            Ok(settings) => {
                log::info!("Loaded settings");
                settings.sanitized()
            }
            Err(e) => {
                log::warn!("Ignoring unreadable settings ({}), using defaults", e);
                Self::default()
            }
        }
    }

    /// Serialize for storage
    pub fn to_json(&self) -> String {
        // Plain data with no maps keyed by non-strings; serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Clamp out-of-range values from hand-edited files
    fn sanitized(mut self) -> Self {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
        self.camera_smoothing = if self.camera_smoothing.is_finite() {
            self.camera_smoothing.clamp(0.01, 1.0)
        } else {
            Self::default().camera_smoothing
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_keeps_values() {
        let settings = Settings {
            muted: true,
            music_volume: 0.25,
            ..Default::default()
        };
        assert_eq!(Settings::from_json(&settings.to_json()), settings);
    }

    #[test]
    fn test_garbage_falls_back_to_defaults() {
        assert_eq!(Settings::from_json("not json"), Settings::default());
    }

    #[test]
    fn test_partial_document_is_clamped() {
        let settings = Settings::from_json(r#"{"master_volume": 4.0, "camera_smoothing": 0.0}"#);
        assert_eq!(settings.master_volume, 1.0);
        assert_eq!(settings.camera_smoothing, 0.01);
        assert_eq!(settings.sfx_volume, 1.0);
    }
}
