//! JS binding for the browser host
//!
//! The page owns the canvas, the animation-frame loop and DOM events; it
//! forwards them here and replays `display_list_json()` with Canvas 2D.

use glam::Vec2;
use wasm_bindgen::prelude::*;

use super::{FrameClock, to_canvas};
use crate::audio::AudioManager;
use crate::game::{Game, GameMode};
use crate::persistence::{LocalStorage, MemoryStorage, Storage};
use crate::renderer::build_display_list;
use crate::settings::Settings;

#[wasm_bindgen]
pub struct WebGame {
    game: Game,
    audio: AudioManager,
    clock: FrameClock,
    /// Canvas element bounding box in client space
    rect_origin: Vec2,
    rect_size: Vec2,
}

#[wasm_bindgen]
impl WebGame {
    /// `width`/`height` are the canvas backing-store size; `images` the
    /// optional background pictures; `settings_json` optional gameplay and
    /// audio settings
    #[wasm_bindgen(constructor)]
    pub fn new(
        width: f32,
        height: f32,
        images: Vec<String>,
        settings_json: Option<String>,
    ) -> WebGame {
        console_error_panic_hook::set_once();
        // A second instance finds the logger already installed
        let _ = console_log::init_with_level(log::Level::Info);

        let storage: Box<dyn Storage> = match LocalStorage::open() {
            Ok(s) => Box::new(s),
            Err(e) => {
                log::warn!("{e}, progress will not be saved");
                Box::new(MemoryStorage::new())
            }
        };

        let mut settings = settings_json
            .as_deref()
            .map(Settings::from_json)
            .unwrap_or_default();
        if !images.is_empty() {
            settings.background_images = images;
        }

        let mut audio = AudioManager::new();
        audio.apply_settings(&settings);

        let canvas = Vec2::new(width, height);
        let seed = js_sys::Date::now() as u64;
        log::info!("Puzzle Verify starting...");

        WebGame {
            game: Game::new(settings, storage, canvas, seed),
            audio,
            clock: FrameClock::new(),
            rect_origin: Vec2::ZERO,
            rect_size: canvas,
        }
    }

    /// Canvas element bounding box, from `getBoundingClientRect()`
    pub fn set_client_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.rect_origin = Vec2::new(x, y);
        self.rect_size = Vec2::new(w, h);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.game.resize(Vec2::new(width, height));
    }

    /// Called from `requestAnimationFrame`
    pub fn frame(&mut self, time_ms: f64) {
        let dt = self.clock.tick(time_ms);
        self.game.update(dt);
        self.flush_audio();
    }

    /// Page became visible again
    pub fn resume(&mut self) {
        self.clock.reset();
    }

    pub fn pointer_down(&mut self, client_x: f32, client_y: f32) -> bool {
        let pos = self.canvas_point(client_x, client_y);
        let hit = self.game.pointer_down(pos);
        self.flush_audio();
        hit
    }

    pub fn pointer_move(&mut self, client_x: f32, client_y: f32) {
        let pos = self.canvas_point(client_x, client_y);
        self.game.pointer_move(pos);
    }

    pub fn pointer_up(&mut self) {
        self.game.pointer_up();
        self.flush_audio();
    }

    pub fn start(&mut self, crazy: bool) {
        let mode = if crazy {
            GameMode::Crazy
        } else {
            GameMode::Regular
        };
        self.game.start(mode);
    }

    pub fn revive(&mut self) -> bool {
        self.game.revive()
    }

    pub fn buy_shield(&mut self) {
        self.game.buy_shield();
    }

    pub fn restart(&mut self) {
        self.game.restart();
    }

    pub fn set_audio(&mut self, master_volume: f32, sfx_volume: f32, muted: bool) {
        self.game.set_audio(master_volume, sfx_volume, muted);
        self.audio.apply_settings(self.game.settings());
    }

    /// Image the page should load for this level, if any
    pub fn pending_background(&self) -> Option<String> {
        self.game.pending_background().map(str::to_string)
    }

    pub fn background_loaded(&mut self, source: &str, width: f32, height: f32) {
        self.game.background_loaded(source, Vec2::new(width, height));
    }

    pub fn background_failed(&mut self, source: &str) {
        self.game.background_failed(source);
    }

    pub fn hud_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.game.hud()).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn display_list_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&build_display_list(&self.game))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl WebGame {
    fn canvas_point(&self, client_x: f32, client_y: f32) -> Vec2 {
        to_canvas(
            Vec2::new(client_x, client_y),
            self.rect_origin,
            self.rect_size,
            self.game.canvas_size(),
        )
    }

    fn flush_audio(&mut self) {
        for cue in self.game.drain_cues() {
            self.audio.play(cue);
        }
    }
}
