//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Pointer coordinates (CSS pixels to canvas pixels)
//! - Frame timing from host timestamps
//! - The JS-facing `WebGame` binding (wasm32 only)

#[cfg(target_arch = "wasm32")]
pub mod web;

use glam::Vec2;

use crate::consts::SIM_DT;

/// Map a client-space pointer position onto the canvas.
///
/// `rect_origin`/`rect_size` are the canvas element's bounding box in client
/// space; the canvas backing store may be larger (device pixel ratio) or
/// stretched.
pub fn to_canvas(client: Vec2, rect_origin: Vec2, rect_size: Vec2, canvas_size: Vec2) -> Vec2 {
    if rect_size.x <= 0.0 || rect_size.y <= 0.0 {
        return client - rect_origin;
    }
    (client - rect_origin) * (canvas_size / rect_size)
}

/// Turns animation-frame timestamps into frame deltas
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_time: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous call; one fixed step on the first frame.
    /// `time_ms` is a monotonic millisecond timestamp.
    pub fn tick(&mut self, time_ms: f64) -> f32 {
        let dt = match self.last_time {
            Some(last) => ((time_ms - last) / 1000.0).max(0.0) as f32,
            None => SIM_DT,
        };
        self.last_time = Some(time_ms);
        dt
    }

    /// Forget the last timestamp, e.g. after the tab was hidden
    pub fn reset(&mut self) {
        self.last_time = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_canvas_scales_by_dpr() {
        let p = to_canvas(
            Vec2::new(110.0, 70.0),
            Vec2::new(10.0, 20.0),
            Vec2::new(450.0, 800.0),
            Vec2::new(900.0, 1600.0),
        );
        assert_eq!(p, Vec2::new(200.0, 100.0));
    }

    #[test]
    fn test_to_canvas_degenerate_rect() {
        let p = to_canvas(Vec2::new(50.0, 50.0), Vec2::new(10.0, 10.0), Vec2::ZERO, Vec2::ONE);
        assert_eq!(p, Vec2::new(40.0, 40.0));
    }

    #[test]
    fn test_frame_clock() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(1000.0), SIM_DT);
        assert!((clock.tick(1032.0) - 0.032).abs() < 1e-6);
        // Timestamps going backwards never yield negative time
        assert_eq!(clock.tick(1000.0), 0.0);
        clock.reset();
        assert_eq!(clock.tick(5000.0), SIM_DT);
    }
}
