//! Combo / protection / high-energy state machine
//!
//! Every rule is evaluated against the combo count observed *before* the
//! round outcome is applied. Protection and High Energy are derived from the
//! count; `combo_mode` tracks whether a failure should be absorbed.

use serde::{Deserialize, Serialize};

use crate::audio::Cue;
use crate::settings::GameConfig;
use crate::sim::input::{Accuracy, Placement, SpeedRating};
use crate::sim::tick::FailReason;

/// Scoring mode picked at game start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// Half points
    Regular,
    #[default]
    Crazy,
}

/// Combo tier derived from the combo count
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComboPhase {
    Normal,
    Protected,
    HighEnergy,
}

/// Individual multiplier factors of one placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Multiplier {
    pub accuracy: f64,
    pub speed: f64,
    pub protection: f64,
    pub high_energy: f64,
    pub mode: f64,
}

impl Multiplier {
    /// Build the factor chain for a placement scored in `phase`
    pub fn compose(placement: &Placement, phase: ComboPhase, mode: GameMode) -> Self {
        Self {
            accuracy: match placement.accuracy {
                Accuracy::Perfect => 2.0,
                Accuracy::Good => 1.5,
                Accuracy::Bad => 1.0,
            },
            speed: match placement.speed {
                SpeedRating::Godlike => 1.5,
                SpeedRating::Normal => 1.0,
                SpeedRating::Slow => 0.8,
            },
            protection: if phase >= ComboPhase::Protected { 2.0 } else { 1.0 },
            high_energy: if phase == ComboPhase::HighEnergy { 1.5 } else { 1.0 },
            mode: match mode {
                GameMode::Regular => 0.5,
                GameMode::Crazy => 1.0,
            },
        }
    }

    /// Product of every factor, applied in order
    pub fn total(&self) -> f64 {
        self.accuracy * self.speed * self.protection * self.high_energy * self.mode
    }

    /// `floor(base * total)`
    pub fn points(&self, base: u32) -> u64 {
        (f64::from(base) * self.total()).floor() as u64
    }
}

/// Tone of a feedback banner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackKind {
    Success,
    Fail,
}

/// Transient banner describing the latest round outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub text: String,
    pub sub_text: String,
    pub points: u64,
    pub kind: FeedbackKind,
}

/// Result of scoring one successful placement
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub points: u64,
    pub multiplier: Multiplier,
    pub feedback: Feedback,
    pub cues: Vec<Cue>,
}

/// Combo count, protection flag and shield
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboState {
    pub combo: u32,
    /// Failures become non-fatal combo losses while set
    pub combo_mode: bool,
    /// Absorbs one failure outside combo mode
    pub shield: bool,
}

impl ComboState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tier for the current count
    pub fn phase(&self, cfg: &GameConfig) -> ComboPhase {
        if self.combo >= cfg.high_energy_threshold {
            ComboPhase::HighEnergy
        } else if self.combo >= cfg.protection_threshold {
            ComboPhase::Protected
        } else {
            ComboPhase::Normal
        }
    }

    /// Score a successful placement and advance the combo
    pub fn score_placement(
        &mut self,
        placement: &Placement,
        mode: GameMode,
        cfg: &GameConfig,
    ) -> Scored {
        let phase = self.phase(cfg);
        let multiplier = Multiplier::compose(placement, phase, mode);
        let points = multiplier.points(cfg.base_score);
        let feedback = success_feedback(placement, phase, mode, points);
        let mut cues = Vec::new();

        match placement.accuracy {
            Accuracy::Perfect => {
                self.combo += 1;
                if self.combo >= cfg.protection_threshold && phase == ComboPhase::Normal {
                    self.combo_mode = true;
                    self.shield = true;
                    cues.push(Cue::Combo);
                    log::info!("Protection mode entered at combo {}", self.combo);
                }
                if self.combo == cfg.high_energy_threshold {
                    cues.push(Cue::Combo);
                    log::info!("High energy at combo {}", self.combo);
                }
            }
            Accuracy::Good => match phase {
                ComboPhase::HighEnergy => {
                    // Demoted to exactly the protection threshold
                    self.combo = cfg.protection_threshold;
                    self.combo_mode = true;
                    self.shield = true;
                    log::debug!("High energy lost, combo back to {}", self.combo);
                }
                ComboPhase::Protected => {}
                ComboPhase::Normal => {
                    self.combo = 0;
                    self.combo_mode = false;
                }
            },
            Accuracy::Bad => {
                self.combo = 0;
                self.combo_mode = false;
            }
        }

        Scored {
            points,
            multiplier,
            feedback,
            cues,
        }
    }

    /// Absorb a failure in combo mode: everything resets, the run continues
    pub fn apply_combo_loss(&mut self, reason: FailReason) -> Feedback {
        log::info!("Combo of {} lost to {reason}", self.combo);
        self.combo = 0;
        self.combo_mode = false;
        self.shield = false;
        Feedback {
            text: reason.to_string(),
            sub_text: "Combo Lost - Survival".to_string(),
            points: 0,
            kind: FeedbackKind::Fail,
        }
    }

    pub fn grant_shield(&mut self) {
        self.shield = true;
    }

    /// Use up the shield. Returns false when there was none.
    pub fn consume_shield(&mut self) -> bool {
        std::mem::replace(&mut self.shield, false)
    }

    /// Fresh run; the shield is managed separately by the host
    pub fn reset(&mut self) {
        self.combo = 0;
        self.combo_mode = false;
    }
}

fn success_feedback(
    placement: &Placement,
    phase: ComboPhase,
    mode: GameMode,
    points: u64,
) -> Feedback {
    let mut text = match placement.accuracy {
        Accuracy::Perfect => "PERFECT",
        Accuracy::Good | Accuracy::Bad => "GOOD",
    }
    .to_string();
    let mut sub_text = String::new();

    match placement.speed {
        SpeedRating::Godlike => {
            text.push_str(" + FAST!");
            sub_text = "Speed Bonus x1.5".to_string();
        }
        SpeedRating::Normal => sub_text = "Nice Catch".to_string(),
        SpeedRating::Slow => {}
    }

    if phase >= ComboPhase::Protected {
        sub_text = "Combo Mode x2".to_string();
    }
    if phase == ComboPhase::HighEnergy {
        sub_text = "HIGH ENERGY x3".to_string();
        text = "HIGH ENERGY!".to_string();
    }
    if mode == GameMode::Regular {
        sub_text = "(Regular Mode)".to_string();
    }

    Feedback {
        text,
        sub_text,
        points,
        kind: FeedbackKind::Success,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn placement(accuracy: Accuracy, speed: SpeedRating) -> Placement {
        Placement {
            accuracy,
            speed,
            time_ratio: 0.5,
        }
    }

    fn state(combo: u32, combo_mode: bool, shield: bool) -> ComboState {
        ComboState {
            combo,
            combo_mode,
            shield,
        }
    }

    #[test]
    fn test_full_stack_multiplier_is_nine() {
        let cfg = GameConfig::default();
        let mut combo = state(6, true, false);
        let scored = combo.score_placement(
            &placement(Accuracy::Perfect, SpeedRating::Godlike),
            GameMode::Crazy,
            &cfg,
        );
        assert_eq!(scored.multiplier.total(), 9.0);
        assert_eq!(scored.points, 900);
        assert_eq!(scored.feedback.text, "HIGH ENERGY!");
        assert_eq!(scored.feedback.sub_text, "HIGH ENERGY x3");
    }

    #[test]
    fn test_regular_mode_halves_points() {
        let cfg = GameConfig::default();
        let mut combo = ComboState::new();
        let scored = combo.score_placement(
            &placement(Accuracy::Good, SpeedRating::Normal),
            GameMode::Regular,
            &cfg,
        );
        assert_eq!(scored.points, 75);
        assert_eq!(scored.feedback.text, "GOOD");
        assert_eq!(scored.feedback.sub_text, "(Regular Mode)");
    }

    #[test]
    fn test_slow_perfect() {
        let cfg = GameConfig::default();
        let mut combo = ComboState::new();
        let scored = combo.score_placement(
            &placement(Accuracy::Perfect, SpeedRating::Slow),
            GameMode::Crazy,
            &cfg,
        );
        assert_eq!(scored.points, 160);
        assert_eq!(scored.feedback.text, "PERFECT");
        assert!(scored.feedback.sub_text.is_empty());
    }

    #[test]
    fn test_perfect_enters_protection_once() {
        let cfg = GameConfig::default();
        let mut combo = state(2, false, false);
        let perfect = placement(Accuracy::Perfect, SpeedRating::Normal);

        let scored = combo.score_placement(&perfect, GameMode::Crazy, &cfg);
        assert_eq!(combo.combo, 3);
        assert!(combo.combo_mode && combo.shield);
        assert_eq!(combo.phase(&cfg), ComboPhase::Protected);
        assert_eq!(scored.cues, vec![Cue::Combo]);
        // Scored at the pre-hit tier
        assert_eq!(scored.points, 200);

        assert!(combo.consume_shield());
        let scored = combo.score_placement(&perfect, GameMode::Crazy, &cfg);
        assert_eq!(combo.combo, 4);
        assert!(!combo.shield, "shield only granted on entry");
        assert!(scored.cues.is_empty());
        assert_eq!(scored.feedback.sub_text, "Combo Mode x2");
    }

    #[test]
    fn test_reaching_high_energy_cues_again() {
        let cfg = GameConfig::default();
        let mut combo = state(5, true, false);
        let scored = combo.score_placement(
            &placement(Accuracy::Perfect, SpeedRating::Normal),
            GameMode::Crazy,
            &cfg,
        );
        assert_eq!(combo.combo, 6);
        assert_eq!(combo.phase(&cfg), ComboPhase::HighEnergy);
        assert_eq!(scored.cues, vec![Cue::Combo]);
    }

    #[test]
    fn test_good_keeps_protected_combo() {
        let cfg = GameConfig::default();
        let mut combo = state(4, true, false);
        combo.score_placement(
            &placement(Accuracy::Good, SpeedRating::Normal),
            GameMode::Crazy,
            &cfg,
        );
        assert_eq!(combo, state(4, true, false));
    }

    #[test]
    fn test_good_demotes_high_energy() {
        let cfg = GameConfig::default();
        let mut combo = state(9, true, false);
        combo.score_placement(
            &placement(Accuracy::Good, SpeedRating::Normal),
            GameMode::Crazy,
            &cfg,
        );
        assert_eq!(combo, state(3, true, true));
        assert_eq!(combo.phase(&cfg), ComboPhase::Protected);
    }

    #[test]
    fn test_good_before_protection_resets() {
        let cfg = GameConfig::default();
        let mut combo = state(2, false, true);
        combo.score_placement(
            &placement(Accuracy::Good, SpeedRating::Godlike),
            GameMode::Crazy,
            &cfg,
        );
        assert_eq!(combo, state(0, false, true));
    }

    #[test]
    fn test_combo_loss_clears_everything() {
        let mut combo = state(7, true, true);
        let fb = combo.apply_combo_loss(FailReason::Spiked);
        assert_eq!(combo, ComboState::new());
        assert_eq!(fb.text, "Spiked!");
        assert_eq!(fb.sub_text, "Combo Lost - Survival");
        assert_eq!(fb.points, 0);
        assert_eq!(fb.kind, FeedbackKind::Fail);
    }

    #[test]
    fn test_consume_shield_is_one_shot() {
        let mut combo = ComboState::new();
        assert!(!combo.consume_shield());
        combo.grant_shield();
        assert!(combo.consume_shield());
        assert!(!combo.shield);
    }

    fn any_accuracy() -> impl Strategy<Value = Accuracy> {
        prop_oneof![Just(Accuracy::Perfect), Just(Accuracy::Good)]
    }

    fn any_speed() -> impl Strategy<Value = SpeedRating> {
        prop_oneof![
            Just(SpeedRating::Godlike),
            Just(SpeedRating::Normal),
            Just(SpeedRating::Slow)
        ]
    }

    proptest! {
        #[test]
        fn prop_points_follow_multiplier(
            accuracy in any_accuracy(),
            speed in any_speed(),
            combo in 0u32..12,
            regular in any::<bool>(),
            base in 1u32..1000,
        ) {
            let cfg = GameConfig { base_score: base, ..GameConfig::default() };
            let mode = if regular { GameMode::Regular } else { GameMode::Crazy };
            let mut state = ComboState { combo, combo_mode: combo >= 3, shield: false };
            let scored = state.score_placement(&placement(accuracy, speed), mode, &cfg);
            let m = scored.multiplier;
            prop_assert_eq!(scored.points, (f64::from(base) * m.total()).floor() as u64);
            prop_assert!(m.total() <= 9.0);
            // Protection tier never lowers the combo on a success
            if combo >= 3 {
                prop_assert!(state.combo >= 3);
            }
        }
    }
}
