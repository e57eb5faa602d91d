//! Per-frame round simulation
//!
//! A `Round` is the simulation context of one level: the generated entities,
//! the elapsed clock, the drag state shared with the pointer handlers and the
//! resolved flag that lets at most one outcome through.

use std::fmt;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::Effects;
use super::input::Placement;
use super::state::{Level, ObstacleKind, ZoneKind};
use crate::audio::Cue;
use crate::consts::*;
use crate::scoring::ComboState;

/// Wind is halved when it acts on a dragged piece
pub const WIND_DRAG_SCALE: f32 = 0.5;

/// Why a round failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailReason {
    TimeOut,
    BadPlacement,
    Spiked,
    HitByBall,
    HitWall,
    SuckedIntoVoid,
}

impl FailReason {
    /// Player-facing text
    pub fn message(self) -> &'static str {
        match self {
            FailReason::TimeOut => "Time Out",
            FailReason::BadPlacement => "Bad Placement",
            FailReason::Spiked => "Spiked!",
            FailReason::HitByBall => "Hit by Ball",
            FailReason::HitWall => "Hit Wall",
            FailReason::SuckedIntoVoid => "Sucked into Void",
        }
    }
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// The single outcome a round resolves to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Success(Placement),
    /// Failure absorbed by combo mode; the run continues at the next level
    ComboLoss(FailReason),
    GameOver(FailReason),
}

/// Decision taken for one failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureVerdict {
    /// Round already resolved
    Ignored,
    /// Shield took the hit; round continues
    ShieldAbsorbed,
    ComboLoss(FailReason),
    GameOver(FailReason),
}

impl FailureVerdict {
    pub fn outcome(self) -> Option<RoundOutcome> {
        match self {
            FailureVerdict::Ignored | FailureVerdict::ShieldAbsorbed => None,
            FailureVerdict::ComboLoss(r) => Some(RoundOutcome::ComboLoss(r)),
            FailureVerdict::GameOver(r) => Some(RoundOutcome::GameOver(r)),
        }
    }
}

/// An active drag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drag {
    pub piece_id: u32,
    /// Pointer position minus piece top-left at pick-up
    pub offset: Vec2,
    /// Latest pointer position
    pub pointer: Vec2,
    /// Force-field displacement accumulated on top of pointer-follow
    pub drift: Vec2,
}

/// Simulation context of one level
#[derive(Debug, Clone)]
pub struct Round {
    pub level: Level,
    /// Seconds since level start
    pub elapsed: f32,
    /// Set once an outcome has been emitted
    pub resolved: bool,
    pub drag: Option<Drag>,
    pub effects: Effects,
    /// Cues raised since the host last drained them
    pub cues: Vec<Cue>,
    /// A shield already absorbed a failure during the current frame
    shield_spent: bool,
    rng: Pcg32,
}

impl Round {
    /// Start a round on a freshly generated level. `seed` drives cosmetic randomness.
    pub fn new(level: Level, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let effects = Effects::for_level(&level, &mut rng);
        Self {
            level,
            elapsed: 0.0,
            resolved: false,
            drag: None,
            effects,
            cues: Vec::new(),
            shield_spent: false,
            rng,
        }
    }

    pub fn time_limit(&self) -> f32 {
        self.level.config.time_limit
    }

    /// `elapsed / time_limit`, unclamped
    pub fn time_ratio(&self) -> f32 {
        self.elapsed / self.time_limit()
    }

    /// Remaining time as a 0-1 ratio
    pub fn time_remaining(&self) -> f32 {
        (1.0 - self.time_ratio()).clamp(0.0, 1.0)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Ripple and spark burst at `center`
    pub fn celebrate(&mut self, center: Vec2) {
        self.effects.celebrate(center, &mut self.rng);
    }

    pub fn take_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }
}

/// Route a failure through shield / combo-mode arbitration.
///
/// Combo mode wins over the shield: a protected player loses the combo but
/// keeps playing. Outside combo mode a shield swallows every failure raised in
/// the frame it pops in.
pub fn resolve_failure(
    round: &mut Round,
    combo: &mut ComboState,
    reason: FailReason,
) -> FailureVerdict {
    if round.resolved {
        return FailureVerdict::Ignored;
    }

    if combo.combo_mode {
        round.resolved = true;
        round.cues.push(Cue::Fail);
        log::info!("Level {} combo loss: {reason}", round.level.config.level);
        return FailureVerdict::ComboLoss(reason);
    }

    if round.shield_spent {
        return FailureVerdict::ShieldAbsorbed;
    }
    if combo.consume_shield() {
        round.shield_spent = true;
        round.cues.push(Cue::Pop);
        log::info!("Shield absorbed {reason}");
        return FailureVerdict::ShieldAbsorbed;
    }

    round.resolved = true;
    round.cues.push(Cue::Fail);
    log::info!("Level {} failed: {reason}", round.level.config.level);
    FailureVerdict::GameOver(reason)
}

/// Advance the round by one frame
pub fn tick(round: &mut Round, combo: &mut ComboState, dt: f32) -> Option<RoundOutcome> {
    round.shield_spent = false;

    // 1. Clock
    round.elapsed += dt;
    if round.elapsed > round.time_limit() && !round.resolved && !round.is_dragging() {
        let verdict = resolve_failure(round, combo, FailReason::TimeOut);
        if let Some(outcome) = verdict.outcome() {
            return Some(outcome);
        }
    }

    // 2. Decorations
    round.effects.update(&mut round.rng);

    // 3. Moving hazards
    let bounds = round.level.bounds;
    for obstacle in &mut round.level.obstacles {
        obstacle.advance(bounds);
    }

    // 4. Force fields on the dragged piece
    apply_drag_forces(round);

    // 5. Collisions
    let mut outcome = None;
    for reason in detect_collisions(&round.level) {
        if let Some(o) = resolve_failure(round, combo, reason).outcome() {
            outcome.get_or_insert(o);
        }
    }
    // Input handled before the next frame sees no shield
    round.shield_spent = false;
    outcome
}

/// Sum of zone forces on a point, wind scaled for dragging
pub fn drag_force(level: &Level, point: Vec2) -> Vec2 {
    level
        .zones
        .iter()
        .filter_map(|z| {
            let f = z.force_at(point)?;
            Some(if z.is_wind() { f * WIND_DRAG_SCALE } else { f })
        })
        .sum()
}

fn apply_drag_forces(round: &mut Round) {
    let Some(drag) = round.drag.as_mut() else {
        return;
    };
    let Some(piece) = round.level.piece(drag.piece_id) else {
        return;
    };

    let force = drag_force(&round.level, piece.center());
    drag.drift = (drag.drift + force) * DRIFT_RETENTION;

    let target = drag.pointer - drag.offset + drag.drift;
    let delta = target - piece.pos;
    let id = drag.piece_id;
    round.level.translate_pair(id, delta);
}

/// Failures raised by touched pieces this frame, in check order
pub fn detect_collisions(level: &Level) -> Vec<FailReason> {
    let mut hits = Vec::new();
    for piece in level.pieces.iter().filter(|p| p.touched) {
        let center = piece.center();
        let r = piece.radius();

        for zone in &level.zones {
            if let ZoneKind::Well { center: c, .. } = zone.kind {
                if center.distance(c) < WELL_KILL_RADIUS {
                    hits.push(FailReason::SuckedIntoVoid);
                }
            }
        }

        for obstacle in &level.obstacles {
            if center.distance(obstacle.pos) < (r + obstacle.radius()) * CONTACT_GRACE {
                hits.push(match obstacle.kind {
                    ObstacleKind::StaticSpike => FailReason::Spiked,
                    ObstacleKind::DynamicBall => FailReason::HitByBall,
                });
            }
        }

        if piece.rect().exceeds(level.bounds, WALL_TOLERANCE) {
            hits.push(FailReason::HitWall);
        }
    }
    hits
}
