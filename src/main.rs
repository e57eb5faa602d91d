//! Puzzle Verify entry point
//!
//! The browser build is driven from JS through `platform::web::WebGame`.
//! Natively this runs a headless autoplay session that drags each piece
//! straight onto its outline and logs how far it gets.

#[cfg(not(target_arch = "wasm32"))]
mod autoplay {
    use glam::Vec2;

    use puzzle_verify::consts::SIM_DT;
    use puzzle_verify::persistence::{FileStorage, MemoryStorage, Storage};
    use puzzle_verify::sim::SilhouetteTarget;
    use puzzle_verify::{Game, GameMode, GamePhase, Settings};

    /// Pointer speed of the bot (px per frame)
    const BOT_SPEED: f32 = 12.0;
    /// Give up after this much simulated time
    const MAX_SECONDS: f32 = 600.0;

    enum Bot {
        Idle,
        /// Holding a piece, heading for `target`
        Dragging { pointer: Vec2, target: Vec2 },
    }

    pub fn run(max_levels: u32, seed: u64) {
        let storage: Box<dyn Storage> =
            match FileStorage::open(std::env::temp_dir().join("puzzle-verify")) {
                Ok(s) => Box::new(s),
                Err(e) => {
                    log::warn!("{e}, using in-memory storage");
                    Box::new(MemoryStorage::new())
                }
            };
        let settings = Settings::default();
        let perfect = settings.game.perfect_distance;

        let mut game = Game::new(settings, storage, Vec2::new(450.0, 800.0), seed);
        game.start(GameMode::Crazy);

        let mut bot = Bot::Idle;
        let mut level = game.level();
        let mut t = 0.0;

        while t < MAX_SECONDS && game.phase() == GamePhase::Playing && game.level() <= max_levels {
            if game.level() != level {
                level = game.level();
                bot = Bot::Idle;
            }

            bot = match bot {
                Bot::Idle => pick_up(&mut game),
                Bot::Dragging { pointer, target } => {
                    let step = (target - pointer).clamp_length_max(BOT_SPEED);
                    let pointer = pointer + step;
                    game.pointer_move(pointer);
                    if pointer.distance(target) < perfect / 2.0 {
                        game.pointer_up();
                        Bot::Idle
                    } else {
                        Bot::Dragging { pointer, target }
                    }
                }
            };

            game.update(SIM_DT);
            for cue in game.drain_cues() {
                log::debug!("cue {cue:?}");
            }
            t += SIM_DT;
        }

        let hud = game.hud();
        log::info!(
            "Autoplay finished: level {}, score {}, best {}, {:?}",
            hud.level,
            hud.score,
            hud.high_score,
            hud.game_over_reason
        );
        println!(
            "level {} | score {} | high score {} | {}",
            hud.level,
            hud.score,
            hud.high_score,
            hud.game_over_reason.as_deref().unwrap_or("still playing")
        );
    }

    /// Grab the first piece that has a real outline, by its center
    fn pick_up(game: &mut Game) -> Bot {
        let Some(round) = game.round() else {
            return Bot::Idle;
        };
        if round.resolved {
            return Bot::Idle;
        }
        let level = &round.level;
        let pair = level.pieces.iter().find_map(|p| {
            level
                .silhouettes
                .iter()
                .find(|s| s.target == SilhouetteTarget::Piece(p.id))
                .map(|s| (p.center(), s.center()))
        });
        let Some((from, target)) = pair else {
            return Bot::Idle;
        };

        if game.pointer_down(from) {
            Bot::Dragging {
                pointer: from,
                target,
            }
        } else {
            Bot::Idle
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Puzzle Verify (native) starting...");
    log::info!("The playable build targets wasm32; running headless autoplay");

    let mut args = std::env::args().skip(1);
    let max_levels = args.next().and_then(|a| a.parse().ok()).unwrap_or(20);
    let seed = args.next().and_then(|a| a.parse().ok()).unwrap_or(42);

    autoplay::run(max_levels, seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is WebGame, this is just to satisfy the compiler
}
