//! Pointer interaction
//!
//! Coordinates are canvas-local; the host scales device coordinates first.
//! Only one piece can be dragged at a time. While dragging, `pointer_move`
//! only records the pointer; the frame tick derives the piece position from
//! it so force fields can perturb the follow.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::tick::{Drag, FailReason, Round, RoundOutcome, resolve_failure};
use crate::audio::Cue;
use crate::scoring::ComboState;
use crate::settings::GameConfig;

/// Time ratio at or below which a placement is Godlike
pub const GODLIKE_RATIO: f32 = 0.3;
/// Time ratio at or above which a placement is Slow
pub const SLOW_RATIO: f32 = 0.7;
/// Slack for clock comparisons against summed frame steps (seconds)
const CLOCK_EPSILON: f32 = 1e-4;

/// Release accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Accuracy {
    Perfect,
    Good,
    Bad,
}

/// Release speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedRating {
    Godlike,
    Normal,
    Slow,
}

/// A successful placement handed to scoring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub accuracy: Accuracy,
    pub speed: SpeedRating,
    /// `elapsed / time_limit` at release
    pub time_ratio: f32,
}

/// Classify a release by center-to-center distance
pub fn classify_accuracy(distance: f32, cfg: &GameConfig) -> Accuracy {
    if distance <= cfg.perfect_distance {
        Accuracy::Perfect
    } else if distance <= cfg.good_distance {
        Accuracy::Good
    } else {
        Accuracy::Bad
    }
}

/// Classify a release by how much of the time budget it used
pub fn classify_speed(time_ratio: f32) -> SpeedRating {
    if time_ratio <= GODLIKE_RATIO {
        SpeedRating::Godlike
    } else if time_ratio >= SLOW_RATIO {
        SpeedRating::Slow
    } else {
        SpeedRating::Normal
    }
}

/// Pick up the top-most piece under `pos`. Returns true on a hit.
pub fn pointer_down(round: &mut Round, pos: Vec2, cfg: &GameConfig) -> bool {
    // Mis-taps carried over from the previous screen
    if round.elapsed + CLOCK_EPSILON < cfg.input_grace_secs {
        log::debug!("Pick-up ignored during input grace");
        return false;
    }
    if round.resolved || round.is_dragging() {
        return false;
    }

    let Some(piece) = round
        .level
        .pieces
        .iter_mut()
        .rev()
        .find(|p| p.rect().contains(pos))
    else {
        return false;
    };

    piece.touched = true;
    let piece_id = piece.id;
    let offset = pos - piece.pos;
    let partner = piece.linked;

    if let Some(partner) = partner.and_then(|id| round.level.piece_mut(id)) {
        partner.touched = true;
    }

    round.drag = Some(Drag {
        piece_id,
        offset,
        pointer: pos,
        drift: Vec2::ZERO,
    });
    round.cues.push(Cue::Pop);
    true
}

/// Track the pointer while dragging
pub fn pointer_move(round: &mut Round, pos: Vec2) {
    if let Some(drag) = round.drag.as_mut() {
        drag.pointer = pos;
    }
}

/// Drop the dragged piece and judge the placement
pub fn pointer_up(
    round: &mut Round,
    combo: &mut ComboState,
    cfg: &GameConfig,
) -> Option<RoundOutcome> {
    let drag = round.drag.take()?;
    let piece = round.level.piece(drag.piece_id)?;

    let Some(target) = round.level.silhouette_for(piece.id) else {
        round.cues.push(Cue::Bad);
        return resolve_failure(round, combo, FailReason::BadPlacement).outcome();
    };

    let distance = piece.center().distance(target.center());
    let accuracy = classify_accuracy(distance, cfg);
    if accuracy == Accuracy::Bad {
        round.cues.push(Cue::Bad);
        return resolve_failure(round, combo, FailReason::BadPlacement).outcome();
    }

    // Snap; the partner keeps its offset and so lands on its own outline
    let snap = target.pos - piece.pos;
    let target_center = target.center();
    round.level.translate_pair(drag.piece_id, snap);

    if accuracy == Accuracy::Perfect {
        round.cues.push(Cue::Perfect);
        round.celebrate(target_center);
    } else {
        round.cues.push(Cue::Good);
    }

    if round.resolved {
        return None;
    }
    round.resolved = true;

    let time_ratio = round.time_ratio();
    let placement = Placement {
        accuracy,
        speed: classify_speed(time_ratio),
        time_ratio,
    };
    log::info!(
        "Level {} placed: {:?} {:?} ({distance:.1}px, ratio {time_ratio:.2})",
        round.level.config.level,
        placement.accuracy,
        placement.speed,
    );
    Some(RoundOutcome::Success(placement))
}
