//! Level entities and simulation types
//!
//! A `Level` is built once per level start and discarded wholesale on the
//! next transition; nothing here survives between levels.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;

/// Outline variants shared by pieces and silhouettes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Square,
    Circle,
    Triangle,
    Hexagon,
    PuzzleClassic,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 5] = [
        ShapeKind::Square,
        ShapeKind::Circle,
        ShapeKind::Triangle,
        ShapeKind::Hexagon,
        ShapeKind::PuzzleClassic,
    ];

    /// Uniform pick from the shape pool
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// A draggable piece
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Piece {
    pub id: u32,
    /// Top-left corner
    pub pos: Vec2,
    pub size: f32,
    pub shape: ShapeKind,
    /// Set on first pick-up; a touched piece stays hazard-vulnerable for the rest of the level
    pub touched: bool,
    /// Partner piece that moves in lockstep with this one
    pub linked: Option<u32>,
}

impl Piece {
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::square(self.pos, self.size)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(self.size / 2.0)
    }

    /// Collision radius
    #[inline]
    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }
}

/// Which piece a silhouette accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SilhouetteTarget {
    Piece(u32),
    /// Decoy that accepts nothing
    Fake,
}

/// An outline target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Silhouette {
    pub id: u32,
    pub pos: Vec2,
    pub size: f32,
    pub shape: ShapeKind,
    pub target: SilhouetteTarget,
}

impl Silhouette {
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(self.size / 2.0)
    }

    #[inline]
    pub fn is_fake(&self) -> bool {
        self.target == SilhouetteTarget::Fake
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::square(self.pos, self.size)
    }
}

/// Hazard types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    StaticSpike,
    DynamicBall,
}

/// A hazard. `pos` is the obstacle's center.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub kind: ObstacleKind,
    pub pos: Vec2,
    pub size: f32,
    /// Pixels per frame; zero for static spikes
    pub vel: Vec2,
}

impl Obstacle {
    #[inline]
    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }

    /// Advance one frame, bouncing off the play-area walls.
    ///
    /// The velocity sign flips on any axis where the leading edge has crossed a
    /// wall, then the position is clamped back inside so the ball can't tunnel.
    pub fn advance(&mut self, bounds: Vec2) {
        if self.kind != ObstacleKind::DynamicBall {
            return;
        }
        self.pos += self.vel;
        let r = self.radius();
        if self.pos.x < r || self.pos.x > bounds.x - r {
            self.vel.x = -self.vel.x;
        }
        if self.pos.y < r || self.pos.y > bounds.y - r {
            self.vel.y = -self.vel.y;
        }
        self.pos = self.pos.clamp(Vec2::splat(r), bounds - Vec2::splat(r));
    }
}

/// Force-field payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ZoneKind {
    /// Pushes along `direction` in front of the `start`-`end` source line
    Wind {
        start: Vec2,
        end: Vec2,
        direction: Vec2,
        max_dist: f32,
        strength: f32,
    },
    /// Pulls toward `center` within `radius`
    Well {
        center: Vec2,
        radius: f32,
        strength: f32,
    },
}

/// A force field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: u32,
    pub kind: ZoneKind,
}

impl Zone {
    /// Raw field force on a point (before any drag scaling)
    pub fn force_at(&self, point: Vec2) -> Option<Vec2> {
        match self.kind {
            ZoneKind::Wind {
                start,
                end,
                direction,
                max_dist,
                strength,
            } => super::geometry::wind_force(start, end, direction, max_dist, strength, point),
            ZoneKind::Well {
                center,
                radius,
                strength,
            } => super::geometry::well_pull(center, radius, strength, point),
        }
    }

    pub fn is_wind(&self) -> bool {
        matches!(self.kind, ZoneKind::Wind { .. })
    }
}

/// Entity counts and time budget for one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub level: u32,
    /// Seconds
    pub time_limit: f32,
    pub pieces: u32,
    pub fake_silhouettes: u32,
    pub static_spikes: u32,
    pub dynamic_spikes: u32,
    pub wind_zones: u32,
    pub gravity_wells: u32,
    pub linked_pieces: bool,
}

/// All entities of one generated level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub config: LevelConfig,
    /// Canvas size
    pub bounds: Vec2,
    /// Creation order; later entries are drawn (and hit-tested) on top
    pub pieces: Vec<Piece>,
    pub silhouettes: Vec<Silhouette>,
    pub obstacles: Vec<Obstacle>,
    pub zones: Vec<Zone>,
    next_id: u32,
}

impl Level {
    /// Empty level for the given config and canvas size
    pub fn empty(config: LevelConfig, bounds: Vec2) -> Self {
        Self {
            config,
            bounds,
            pieces: Vec::new(),
            silhouettes: Vec::new(),
            obstacles: Vec::new(),
            zones: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn piece(&self, id: u32) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.id == id)
    }

    pub fn piece_mut(&mut self, id: u32) -> Option<&mut Piece> {
        self.pieces.iter_mut().find(|p| p.id == id)
    }

    /// The silhouette that accepts `piece_id`, if any
    pub fn silhouette_for(&self, piece_id: u32) -> Option<&Silhouette> {
        self.silhouettes
            .iter()
            .find(|s| s.target == SilhouetteTarget::Piece(piece_id))
    }

    /// Translate a piece and its linked partner by the same delta
    pub fn translate_pair(&mut self, piece_id: u32, delta: Vec2) {
        let linked = match self.piece_mut(piece_id) {
            Some(piece) => {
                piece.pos += delta;
                piece.linked
            }
            None => return,
        };
        if let Some(partner) = linked.and_then(|id| self.piece_mut(id)) {
            partner.pos += delta;
        }
    }

    /// Centers of every piece and silhouette (placement safety checks)
    pub fn anchor_centers(&self) -> impl Iterator<Item = (Vec2, f32)> + '_ {
        self.pieces
            .iter()
            .map(|p| (p.center(), p.radius()))
            .chain(self.silhouettes.iter().map(|s| (s.center(), s.size / 2.0)))
    }
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}
