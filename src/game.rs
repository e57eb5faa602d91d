//! Root game driver
//!
//! Owns the run: mode, level index, score, combo state, the current `Round`
//! and the deferred transitions between levels. Hosts feed it frame time and
//! canvas-space pointer events, then read back a `Hud`, a display list and the
//! queued audio cues.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::audio::Cue;
use crate::background::Background;
use crate::consts::*;
use crate::highscores::HighScore;
use crate::persistence::Storage;
use crate::schedule::{Scheduler, TaskHandle};
use crate::scoring::{ComboPhase, ComboState, Feedback};
use crate::settings::{GameConfig, Settings};
use crate::sim::{self, FailReason, Level, RngState, Round, RoundOutcome};

pub use crate::scoring::GameMode;

/// Delay before the next level after a success (seconds)
pub const ADVANCE_DELAY: f32 = 0.05;
/// Delay before the next level after a combo loss
pub const COMBO_LOSS_DELAY: f32 = 0.5;
/// How long a feedback banner stays up
pub const FEEDBACK_DURATION: f32 = 0.7;
/// Delay before a revive or purchased shield takes effect
pub const GRANT_DELAY: f32 = 1.0;

/// Top-level screen state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    ModeSelect,
    Playing,
    GameOver,
}

/// Colour band of the time bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeBand {
    Ok,
    Warning,
    Danger,
}

impl TimeBand {
    pub fn for_remaining(remaining: f32) -> Self {
        if remaining < 0.3 {
            TimeBand::Danger
        } else if remaining < 0.7 {
            TimeBand::Warning
        } else {
            TimeBand::Ok
        }
    }
}

/// Snapshot for the host UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hud {
    pub phase: GamePhase,
    pub mode: GameMode,
    pub level: u32,
    pub score: u64,
    pub high_score: u64,
    /// 1 at level start, 0 when time is up
    pub time_remaining: f32,
    pub time_band: TimeBand,
    pub combo: u32,
    pub combo_mode: bool,
    pub high_energy: bool,
    pub shield: bool,
    /// Display scale of the combo counter
    pub combo_scale: f32,
    pub feedback: Option<Feedback>,
    pub game_over_reason: Option<String>,
}

/// Deferred state changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    AdvanceLevel,
    ClearFeedback,
    Revive,
    GrantShield,
}

/// The game
pub struct Game {
    settings: Settings,
    storage: Box<dyn Storage>,
    canvas: Vec2,
    phase: GamePhase,
    mode: GameMode,
    level: u32,
    score: u64,
    combo: ComboState,
    high_score: HighScore,
    round: Option<Round>,
    background: Option<Background>,
    feedback: Option<Feedback>,
    game_over_reason: Option<FailReason>,
    scheduler: Scheduler<Transition>,
    /// Level advance or revive
    transition_slot: Option<TaskHandle>,
    feedback_slot: Option<TaskHandle>,
    shield_slot: Option<TaskHandle>,
    rng: Pcg32,
    accumulator: f32,
    seed: RngState,
    cues: Vec<Cue>,
}

impl Game {
    pub fn new(settings: Settings, storage: Box<dyn Storage>, canvas: Vec2, seed: u64) -> Self {
        let high_score = HighScore::load(storage.as_ref());
        log::info!("Game created ({}x{}, seed {seed})", canvas.x, canvas.y);
        let seed = RngState::new(seed);
        Self {
            settings,
            storage,
            canvas,
            phase: GamePhase::ModeSelect,
            mode: GameMode::default(),
            level: 1,
            score: 0,
            combo: ComboState::new(),
            high_score,
            round: None,
            background: None,
            feedback: None,
            game_over_reason: None,
            scheduler: Scheduler::new(),
            transition_slot: None,
            feedback_slot: None,
            shield_slot: None,
            rng: seed.to_rng(),
            seed,
            accumulator: 0.0,
            cues: Vec::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.settings.game
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> &ComboState {
        &self.combo
    }

    pub fn high_score(&self) -> u64 {
        self.high_score.best()
    }

    /// Seed the run RNG started from
    pub fn seed(&self) -> u64 {
        self.seed.seed
    }

    pub fn canvas_size(&self) -> Vec2 {
        self.canvas
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Change audio preferences for this session
    pub fn set_audio(&mut self, master_volume: f32, sfx_volume: f32, muted: bool) {
        self.settings.master_volume = master_volume.clamp(0.0, 1.0);
        self.settings.sfx_volume = sfx_volume.clamp(0.0, 1.0);
        self.settings.muted = muted;
    }

    /// New canvas size; takes effect from the next level
    pub fn resize(&mut self, canvas: Vec2) {
        self.canvas = canvas;
    }

    /// Begin a new run in `mode`
    pub fn start(&mut self, mode: GameMode) {
        self.cancel_pending();
        self.mode = mode;
        self.phase = GamePhase::Playing;
        self.level = 1;
        self.score = 0;
        self.combo.reset();
        self.feedback = None;
        self.game_over_reason = None;
        log::info!("Run started in {mode:?} mode");
        self.start_level();
    }

    /// Generate and enter the current level
    fn start_level(&mut self) {
        let config = sim::level_config(self.level, &mut self.rng);
        let level = sim::generate_level(&config, self.canvas, &self.settings.game, &mut self.rng);
        self.play_level(level);
    }

    /// Enter a prepared level
    pub fn play_level(&mut self, level: Level) {
        let seed = self.rng.random();
        self.background = Some(Background::choose(
            &self.settings.background_images,
            level.bounds,
            &mut self.rng,
        ));
        self.round = Some(Round::new(level, seed));
        self.accumulator = 0.0;
    }

    /// Advance by `dt` seconds of wall time
    pub fn update(&mut self, dt: f32) {
        let dt = dt.clamp(0.0, 0.1);

        for (handle, transition) in self.scheduler.advance(dt) {
            self.run_transition(handle, transition);
        }

        if self.phase != GamePhase::Playing {
            return;
        }

        self.accumulator += dt;
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.step();
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
    }

    fn step(&mut self) {
        let Some(round) = self.round.as_mut() else {
            return;
        };
        let outcome = sim::tick(round, &mut self.combo, SIM_DT);
        self.cues.extend(round.take_cues());
        if let Some(outcome) = outcome {
            self.apply_outcome(outcome);
        }
    }

    pub fn pointer_down(&mut self, pos: Vec2) -> bool {
        if self.phase != GamePhase::Playing {
            return false;
        }
        let Some(round) = self.round.as_mut() else {
            return false;
        };
        let hit = sim::pointer_down(round, pos, &self.settings.game);
        self.cues.extend(round.take_cues());
        hit
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        if self.phase != GamePhase::Playing {
            return;
        }
        if let Some(round) = self.round.as_mut() {
            sim::pointer_move(round, pos);
        }
    }

    pub fn pointer_up(&mut self) {
        let Some(round) = self.round.as_mut() else {
            return;
        };
        let outcome = sim::pointer_up(round, &mut self.combo, &self.settings.game);
        self.cues.extend(round.take_cues());
        if let Some(outcome) = outcome {
            self.apply_outcome(outcome);
        }
    }

    fn apply_outcome(&mut self, outcome: RoundOutcome) {
        match outcome {
            RoundOutcome::Success(placement) => {
                let scored = self
                    .combo
                    .score_placement(&placement, self.mode, &self.settings.game);
                self.score += scored.points;
                self.cues.extend(scored.cues);
                log::info!(
                    "Level {} cleared: +{} (x{:.2}), combo {}",
                    self.level,
                    scored.points,
                    scored.multiplier.total(),
                    self.combo.combo
                );
                self.show_feedback(scored.feedback);
                self.scheduler.supersede(
                    &mut self.transition_slot,
                    ADVANCE_DELAY,
                    Transition::AdvanceLevel,
                );
            }
            RoundOutcome::ComboLoss(reason) => {
                let feedback = self.combo.apply_combo_loss(reason);
                self.show_feedback(feedback);
                self.scheduler.supersede(
                    &mut self.transition_slot,
                    COMBO_LOSS_DELAY,
                    Transition::AdvanceLevel,
                );
            }
            RoundOutcome::GameOver(reason) => self.game_over(reason),
        }
    }

    fn game_over(&mut self, reason: FailReason) {
        log::info!(
            "Game over on level {} ({reason}), score {}",
            self.level,
            self.score
        );
        self.high_score.record(self.score, self.storage.as_mut());
        self.combo.reset();
        self.game_over_reason = Some(reason);
        self.phase = GamePhase::GameOver;
    }

    fn show_feedback(&mut self, feedback: Feedback) {
        self.feedback = Some(feedback);
        self.scheduler.supersede(
            &mut self.feedback_slot,
            FEEDBACK_DURATION,
            Transition::ClearFeedback,
        );
    }

    fn run_transition(&mut self, handle: TaskHandle, transition: Transition) {
        for slot in [
            &mut self.transition_slot,
            &mut self.feedback_slot,
            &mut self.shield_slot,
        ] {
            if *slot == Some(handle) {
                *slot = None;
            }
        }

        log::debug!("{transition:?} at {:.2}s", self.scheduler.now());
        match transition {
            Transition::AdvanceLevel => {
                if self.phase == GamePhase::Playing {
                    self.level += 1;
                    self.start_level();
                }
            }
            Transition::ClearFeedback => self.feedback = None,
            Transition::Revive => {
                if self.phase == GamePhase::GameOver {
                    log::info!("Revived on level {}", self.level);
                    self.phase = GamePhase::Playing;
                    self.game_over_reason = None;
                    self.combo.grant_shield();
                    self.start_level();
                }
            }
            Transition::GrantShield => {
                self.combo.grant_shield();
                self.cues.push(Cue::Good);
            }
        }
    }

    /// Resume a finished run on the same level with a shield. Returns false
    /// when there is no game over to revive from.
    pub fn revive(&mut self) -> bool {
        if self.phase != GamePhase::GameOver {
            return false;
        }
        self.scheduler
            .supersede(&mut self.transition_slot, GRANT_DELAY, Transition::Revive);
        true
    }

    /// Grant a shield after a short delay
    pub fn buy_shield(&mut self) {
        self.scheduler
            .supersede(&mut self.shield_slot, GRANT_DELAY, Transition::GrantShield);
    }

    /// Back to mode selection; drops the shield and anything still pending
    pub fn restart(&mut self) {
        self.cancel_pending();
        self.phase = GamePhase::ModeSelect;
        self.combo.shield = false;
        self.round = None;
        self.feedback = None;
        log::info!("Returned to mode select");
    }

    fn cancel_pending(&mut self) {
        self.scheduler.clear();
        self.transition_slot = None;
        self.feedback_slot = None;
        self.shield_slot = None;
    }

    /// Image the host should load for the current level
    pub fn pending_background(&self) -> Option<&str> {
        self.background.as_ref()?.pending_image()
    }

    pub fn background_loaded(&mut self, source: &str, image_size: Vec2) {
        if let Some(bg) = self.background.as_mut() {
            bg.on_image_loaded(source, image_size, &mut self.rng);
        }
    }

    pub fn background_failed(&mut self, source: &str) {
        if let Some(bg) = self.background.as_mut() {
            bg.on_image_failed(source, &mut self.rng);
        }
    }

    pub fn hud(&self) -> Hud {
        let time_remaining = self.round.as_ref().map_or(1.0, Round::time_remaining);
        let combo = self.combo.combo;
        Hud {
            phase: self.phase,
            mode: self.mode,
            level: self.level,
            score: self.score,
            high_score: self.high_score.best(),
            time_remaining,
            time_band: TimeBand::for_remaining(time_remaining),
            combo,
            combo_mode: self.combo.combo_mode,
            high_energy: self.combo.phase(&self.settings.game) == ComboPhase::HighEnergy,
            shield: self.combo.shield,
            combo_scale: (1.0 + combo as f32 * 0.15).min(2.5),
            feedback: self.feedback.clone(),
            game_over_reason: self.game_over_reason.map(|r| r.to_string()),
        }
    }

    /// Cues raised since the last call
    pub fn drain_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;
    use crate::scoring::FeedbackKind;
    use crate::sim::{
        LevelConfig, Obstacle, ObstacleKind, Piece, ShapeKind, Silhouette, SilhouetteTarget,
    };

    const CANVAS: Vec2 = Vec2::new(450.0, 800.0);

    fn game() -> Game {
        Game::new(
            Settings::default(),
            Box::new(MemoryStorage::new()),
            CANVAS,
            42,
        )
    }

    /// One piece at (100,100), its outline at (300,500), nothing else
    fn open_level(level: u32) -> Level {
        let config = LevelConfig {
            level,
            time_limit: 5.0,
            pieces: 1,
            fake_silhouettes: 0,
            static_spikes: 0,
            dynamic_spikes: 0,
            wind_zones: 0,
            gravity_wells: 0,
            linked_pieces: false,
        };
        let mut lvl = Level::empty(config, CANVAS);
        let id = lvl.next_entity_id();
        lvl.pieces.push(Piece {
            id,
            pos: Vec2::new(100.0, 100.0),
            size: 60.0,
            shape: ShapeKind::Hexagon,
            touched: false,
            linked: None,
        });
        let sil = lvl.next_entity_id();
        lvl.silhouettes.push(Silhouette {
            id: sil,
            pos: Vec2::new(300.0, 500.0),
            size: 60.0,
            shape: ShapeKind::Hexagon,
            target: SilhouetteTarget::Piece(id),
        });
        lvl
    }

    fn frames(game: &mut Game, n: usize) {
        for _ in 0..n {
            game.update(SIM_DT);
        }
    }

    /// Pick up at 0.2s, drag onto the outline, release at 1.0s
    fn place_perfectly(game: &mut Game) {
        let level = game.level();
        game.play_level(open_level(level));
        frames(game, 12);
        assert!(game.pointer_down(Vec2::new(130.0, 130.0)));
        game.pointer_move(Vec2::new(330.0, 530.0));
        frames(game, 48);
        game.pointer_up();
    }

    #[test]
    fn test_end_to_end_perfect_fast_placement() {
        let mut g = game();
        g.start(GameMode::Crazy);
        assert_eq!(g.phase(), GamePhase::Playing);
        place_perfectly(&mut g);

        assert_eq!(g.score(), (g.config().base_score as f64 * 3.0).floor() as u64);
        assert_eq!(g.combo().combo, 1);
        let hud = g.hud();
        let fb = hud.feedback.unwrap();
        assert_eq!(fb.text, "PERFECT + FAST!");
        assert_eq!(fb.kind, FeedbackKind::Success);
        assert_eq!(g.level(), 1);
        assert_eq!(g.drain_cues(), vec![Cue::Pop, Cue::Perfect]);

        // Level advances after the short delay
        frames(&mut g, 4);
        assert_eq!(g.level(), 2);
        assert!(!g.round().unwrap().resolved);

        // Feedback clears later
        frames(&mut g, 45);
        assert!(g.hud().feedback.is_none());
    }

    #[test]
    fn test_game_over_records_high_score() {
        let mut g = game();
        g.start(GameMode::Crazy);
        place_perfectly(&mut g);
        frames(&mut g, 4);
        assert_eq!(g.level(), 2);

        // Nobody touches level 2: time runs out
        frames(&mut g, 6 * 60);
        assert_eq!(g.phase(), GamePhase::GameOver);
        let hud = g.hud();
        assert_eq!(hud.game_over_reason.as_deref(), Some("Time Out"));
        assert_eq!(hud.high_score, 300);
        // The level 1 combo does not survive the game over
        assert_eq!(hud.combo, 0);
        assert_eq!(g.combo(), &ComboState::new());
        assert_eq!(
            g.storage()
                .get_item(HighScore::STORAGE_KEY)
                .unwrap()
                .as_deref(),
            Some("300")
        );
    }

    #[test]
    fn test_hazard_after_success_is_ignored() {
        let mut g = game();
        g.start(GameMode::Crazy);
        place_perfectly(&mut g);
        assert_eq!(g.score(), 300);

        // Spike lands on the snapped piece before the advance fires
        let round = g.round.as_mut().unwrap();
        let id = round.level.next_entity_id();
        round.level.obstacles.push(Obstacle {
            id,
            kind: ObstacleKind::StaticSpike,
            pos: Vec2::new(330.0, 530.0),
            size: 50.0,
            vel: Vec2::ZERO,
        });
        frames(&mut g, 1);
        assert_eq!(g.phase(), GamePhase::Playing);
        assert_eq!(g.score(), 300);
        assert_eq!(g.level(), 1);

        frames(&mut g, 3);
        assert_eq!(g.level(), 2);
        frames(&mut g, 30);
        assert_eq!(g.level(), 2, "advanced exactly once");
        assert_eq!(g.phase(), GamePhase::Playing);
        assert_eq!(g.score(), 300);
        assert_eq!(g.drain_cues(), vec![Cue::Pop, Cue::Perfect]);
    }

    #[test]
    fn test_combo_loss_continues_run() {
        let mut g = game();
        g.start(GameMode::Crazy);
        g.combo = ComboState {
            combo: 4,
            combo_mode: true,
            shield: true,
        };
        g.play_level(open_level(1));
        let mut n = 0;
        while !g.round().unwrap().resolved && n < 6 * 60 {
            g.update(SIM_DT);
            n += 1;
        }

        assert_eq!(g.phase(), GamePhase::Playing);
        assert_eq!(g.combo(), &ComboState::new());
        let fb = g.hud().feedback.unwrap();
        assert_eq!(fb.text, "Time Out");
        assert_eq!(fb.sub_text, "Combo Lost - Survival");
        assert_eq!(fb.points, 0);

        frames(&mut g, 31);
        assert_eq!(g.level(), 2);
    }

    #[test]
    fn test_revive_after_delay_with_shield() {
        let mut g = game();
        g.start(GameMode::Regular);
        g.play_level(open_level(1));
        frames(&mut g, 6 * 60);
        assert_eq!(g.phase(), GamePhase::GameOver);
        assert!(!g.hud().shield);

        assert!(g.revive());
        frames(&mut g, 30);
        assert_eq!(g.phase(), GamePhase::GameOver);
        frames(&mut g, 31);
        assert_eq!(g.phase(), GamePhase::Playing);
        assert_eq!(g.level(), 1);
        assert!(g.hud().shield);
        assert!(g.hud().game_over_reason.is_none());
    }

    #[test]
    fn test_buy_shield_plays_good_cue() {
        let mut g = game();
        g.buy_shield();
        frames(&mut g, 61);
        assert!(g.combo().shield);
        assert_eq!(g.drain_cues(), vec![Cue::Good]);
    }

    #[test]
    fn test_restart_cancels_pending_advance() {
        let mut g = game();
        g.start(GameMode::Crazy);
        g.combo.shield = true;
        place_perfectly(&mut g);
        g.restart();
        assert_eq!(g.phase(), GamePhase::ModeSelect);
        assert!(!g.combo().shield);

        g.start(GameMode::Crazy);
        frames(&mut g, 10);
        assert_eq!(g.level(), 1, "stale advance must not fire");
        assert_eq!(g.score(), 0);
    }

    #[test]
    fn test_audio_settings_clamped() {
        let mut g = game();
        g.set_audio(0.8, 2.0, true);
        assert_eq!(g.settings().master_volume, 0.8);
        assert_eq!(g.settings().sfx_volume, 1.0);
        assert_eq!(g.settings().effective_volume(), 0.0);
        g.set_audio(-1.0, 0.5, false);
        assert_eq!(g.settings().master_volume, 0.0);
    }

    #[test]
    fn test_input_ignored_outside_play() {
        let mut g = game();
        assert!(!g.pointer_down(Vec2::new(130.0, 130.0)));
        g.pointer_up();
        assert!(g.drain_cues().is_empty());
    }

    #[test]
    fn test_hud_bands_and_scale() {
        assert_eq!(TimeBand::for_remaining(0.29), TimeBand::Danger);
        assert_eq!(TimeBand::for_remaining(0.3), TimeBand::Warning);
        assert_eq!(TimeBand::for_remaining(0.7), TimeBand::Ok);

        let mut g = game();
        g.combo.combo = 20;
        assert_eq!(g.hud().combo_scale, 2.5);
        assert!(g.hud().high_energy);
        g.combo.combo = 2;
        assert!((g.hud().combo_scale - 1.3).abs() < 1e-6);
    }

    #[test]
    fn test_procedural_background_without_images() {
        let mut g = game();
        g.start(GameMode::Crazy);
        assert!(g.pending_background().is_none());
        assert!(g.background().is_some());
    }

    #[test]
    fn test_background_image_lifecycle() {
        let settings = Settings {
            background_images: vec!["sky.jpg".into()],
            ..Settings::default()
        };
        let mut g = Game::new(settings, Box::new(MemoryStorage::new()), CANVAS, 7);
        g.start(GameMode::Crazy);
        assert_eq!(g.pending_background(), Some("sky.jpg"));
        g.background_loaded("sky.jpg", Vec2::new(1080.0, 1920.0));
        assert!(g.pending_background().is_none());
    }
}
