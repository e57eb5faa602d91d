//! Puzzle Verify - a drag-and-drop silhouette arcade game
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (level generation, forces, collisions, input)
//! - `scoring`: Combo / protection / high-energy state machine
//! - `game`: Root driver that owns the simulation context and level lifecycle
//! - `renderer`: Backend-agnostic display list in fixed draw order
//! - `platform`: Browser/native platform abstraction
//! - `persistence`: Key/value storage backends

pub mod audio;
pub mod background;
pub mod game;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod schedule;
pub mod scoring;
pub mod settings;
pub mod sim;

pub use game::{Game, GameMode, GamePhase, Hud};
pub use highscores::HighScore;
pub use settings::{GameConfig, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one animation frame at 60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Margin used when sampling hazard and zone positions
    pub const PLAY_MARGIN: f32 = 80.0;
    /// Margin used when sampling piece and silhouette positions
    pub const PIECE_MARGIN: f32 = 120.0;
    /// Margin used when sampling dynamic ball spawn points
    pub const BALL_SPAWN_MARGIN: f32 = 60.0;

    /// Static spike footprint (square)
    pub const SPIKE_SIZE: f32 = 50.0;
    /// Dynamic ball diameter
    pub const BALL_SIZE: f32 = 18.0;

    /// Gravity well effect radius
    pub const WELL_RADIUS: f32 = 250.0;
    /// Gravity well base strength
    pub const WELL_STRENGTH: f32 = 1.8;
    /// Distance to a well center that counts as being swallowed
    pub const WELL_KILL_RADIUS: f32 = 30.0;

    /// Wind push strength at the source line
    pub const WIND_STRENGTH: f32 = 4.0;
    /// Wind effect reach as a fraction of canvas width
    pub const WIND_REACH_FRACTION: f32 = 0.6;

    /// Per-frame drift retention while dragging (2% decay)
    pub const DRIFT_RETENTION: f32 = 0.98;
    /// How far a touched piece may leave the canvas before it hits the wall
    pub const WALL_TOLERANCE: f32 = 10.0;
    /// Grace factor applied to piece/obstacle contact radii
    pub const CONTACT_GRACE: f32 = 0.8;

    /// Frames simulated when vetting a dynamic ball's opening trajectory
    pub const TRAJECTORY_FRAMES: u32 = 120;
    /// Extra clearance between a vetted trajectory and any piece
    pub const TRAJECTORY_BUFFER: f32 = 40.0;
}

/// Rotate `point` around `pivot` by `angle` radians
#[inline]
pub fn rotate_about(point: Vec2, pivot: Vec2, angle: f32) -> Vec2 {
    pivot + Vec2::from_angle(angle).rotate(point - pivot)
}

/// Unit vector for an angle in radians
#[inline]
pub fn unit_from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}
