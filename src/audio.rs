//! Audio cues
//!
//! The simulation only emits abstract `Cue`s; the host drains them once per
//! frame and plays them however it likes. On wasm32 `AudioManager` renders
//! each cue as a handful of Web Audio oscillator tones, no sample files needed.

use serde::{Deserialize, Serialize};

/// Sound cue kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cue {
    /// Perfect placement - bright ding
    Perfect,
    /// Good placement - soft blip
    Good,
    /// Bad placement - buzzer
    Bad,
    /// Round failed - crash
    Fail,
    /// Protection or High Energy entered - rising arpeggio
    Combo,
    /// Piece picked up, shield popped
    Pop,
}

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// One enveloped oscillator note
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub freq: f32,
    pub wave: Wave,
    /// Seconds until the decay reaches silence
    pub duration: f64,
    /// Peak gain before master volume
    pub volume: f32,
    /// Seconds after the cue fires
    pub delay: f64,
}

const fn tone(freq: f32, wave: Wave, duration: f64, volume: f32, delay: f64) -> Tone {
    Tone {
        freq,
        wave,
        duration,
        volume,
        delay,
    }
}

const PERFECT: [Tone; 2] = [
    tone(1567.98, Wave::Sine, 0.3, 0.4, 0.0),
    tone(2093.0, Wave::Triangle, 0.15, 0.2, 0.05),
];
const GOOD: [Tone; 1] = [tone(880.0, Wave::Sine, 0.1, 0.3, 0.0)];
// Two detuned squares beat against each other
const BAD: [Tone; 2] = [
    tone(150.0, Wave::Square, 0.3, 0.3, 0.0),
    tone(145.0, Wave::Square, 0.3, 0.3, 0.0),
];
const FAIL: [Tone; 2] = [
    tone(100.0, Wave::Sawtooth, 0.6, 0.6, 0.0),
    tone(60.0, Wave::Square, 0.6, 0.6, 0.1),
];
const COMBO: [Tone; 3] = [
    tone(440.0, Wave::Triangle, 0.15, 0.2, 0.0),
    tone(554.0, Wave::Triangle, 0.15, 0.2, 0.08),
    tone(659.0, Wave::Triangle, 0.2, 0.2, 0.16),
];
const POP: [Tone; 1] = [tone(600.0, Wave::Sine, 0.05, 0.2, 0.0)];

impl Cue {
    /// Notes that make up the cue
    pub fn tones(self) -> &'static [Tone] {
        match self {
            Cue::Perfect => &PERFECT,
            Cue::Good => &GOOD,
            Cue::Bad => &BAD,
            Cue::Fail => &FAIL,
            Cue::Combo => &COMBO,
            Cue::Pop => &POP,
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{Cue, Tone, Wave};

    /// Web Audio cue player
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        /// Master x sfx, zero when muted
        volume: f32,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Fails outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                volume: crate::Settings::default().effective_volume(),
            }
        }

        /// Copy volume and mute preferences
        pub fn apply_settings(&mut self, settings: &crate::Settings) {
            self.volume = settings.effective_volume();
        }

        /// Play a cue
        pub fn play(&self, cue: Cue) {
            let vol = self.volume;
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Browsers keep the context suspended until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            for tone in cue.tones() {
                self.play_tone(ctx, tone, vol);
            }
        }

        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Fast attack, exponential decay
        fn play_tone(&self, ctx: &AudioContext, tone: &Tone, vol: f32) {
            let osc_type = match tone.wave {
                Wave::Sine => OscillatorType::Sine,
                Wave::Square => OscillatorType::Square,
                Wave::Sawtooth => OscillatorType::Sawtooth,
                Wave::Triangle => OscillatorType::Triangle,
            };
            let Some((osc, gain)) = self.create_osc(ctx, tone.freq, osc_type) else {
                return;
            };
            let t = ctx.current_time() + tone.delay;

            gain.gain().set_value_at_time(0.0, t).ok();
            gain.gain()
                .linear_ramp_to_value_at_time(tone.volume * vol, t + 0.01)
                .ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.001, t + tone.duration)
                .ok();

            osc.start_with_when(t).ok();
            osc.stop_with_when(t + tone.duration).ok();
        }
    }
}
