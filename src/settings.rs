//! Game configuration and preferences
//!
//! `GameConfig` holds the numeric knobs the core reads instead of hardcoding.
//! `Settings` wraps it together with host preferences. The host supplies both,
//! optionally as JSON; nothing here is persisted.

use serde::{Deserialize, Serialize};

/// Tunable gameplay constants supplied by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Edge length of every piece and silhouette (px)
    pub piece_size: f32,
    /// Release distance at or below which a placement is Perfect (px)
    pub perfect_distance: f32,
    /// Release distance at or below which a placement is Good (px)
    pub good_distance: f32,
    /// Points before multipliers
    pub base_score: u32,
    /// Combo count that turns on Protection mode
    pub protection_threshold: u32,
    /// Combo count that turns on High Energy mode
    pub high_energy_threshold: u32,
    /// Pointer-down events this soon after level start are ignored (seconds)
    pub input_grace_secs: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            piece_size: 60.0,
            perfect_distance: 8.0,
            good_distance: 18.0,
            base_score: 100,
            protection_threshold: 3,
            high_energy_threshold: 6,
            input_grace_secs: 0.1,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Gameplay knobs
    pub game: GameConfig,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Mute all cues
    pub muted: bool,

    // === Presentation ===
    /// Background image references; empty means always procedural
    pub background_images: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            master_volume: 0.5,
            sfx_volume: 1.0,
            muted: false,
            background_images: Vec::new(),
        }
    }
}

impl Settings {
    /// Effective cue volume (respects mute)
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Parse host-supplied settings. Missing fields take their defaults and
    /// malformed input falls back to `Settings::default()`.
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring malformed settings: {e}");
                Self::default()
            }
        }
    }
}
