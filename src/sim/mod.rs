//! Frame-driven simulation module
//!
//! All gameplay logic lives here:
//! - Fixed 60 Hz frames; velocities and forces are per-frame quantities
//! - Seeded RNG only
//! - Stable iteration order (creation order, which is also entity ID order)
//! - No rendering or platform dependencies

pub mod effects;
pub mod geometry;
pub mod input;
pub mod level;
pub mod state;
pub mod tick;

pub use effects::Effects;
pub use geometry::{Rect, dist_point_to_segment, well_pull, wind_force};
pub use input::{
    Accuracy, Placement, SpeedRating, classify_accuracy, classify_speed, pointer_down,
    pointer_move, pointer_up,
};
pub use level::{generate_level, level_config, time_limit_for};
pub use state::{
    Level, LevelConfig, Obstacle, ObstacleKind, Piece, RngState, ShapeKind, Silhouette,
    SilhouetteTarget, Zone, ZoneKind,
};
pub use tick::{Drag, FailReason, FailureVerdict, Round, RoundOutcome, resolve_failure, tick};
