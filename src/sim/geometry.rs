//! Planar geometry and force-field math
//!
//! Everything here works in canvas space: x grows right, y grows down,
//! units are pixels and per-frame quantities assume one 60 Hz frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle anchored at its top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    /// Square of side `size` at `min`
    pub fn square(min: Vec2, size: f32) -> Self {
        Self {
            min,
            size: Vec2::splat(size),
        }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    /// Inclusive point test (edges count as inside)
    pub fn contains(&self, p: Vec2) -> bool {
        let max = self.max();
        p.x >= self.min.x && p.x <= max.x && p.y >= self.min.y && p.y <= max.y
    }

    /// True when the rect pokes outside `[0, bounds]` by more than `tolerance`
    pub fn exceeds(&self, bounds: Vec2, tolerance: f32) -> bool {
        let max = self.max();
        self.min.x < -tolerance
            || self.min.y < -tolerance
            || max.x > bounds.x + tolerance
            || max.y > bounds.y + tolerance
    }
}

/// Shortest distance from `p` to the segment `a`-`b`
pub fn dist_point_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Falloff applied to wind: full strength at the source, 30% at the edge
#[inline]
pub fn wind_falloff(distance_ratio: f32) -> f32 {
    0.3 + 0.7 * (1.0 - distance_ratio)
}

/// Push exerted by a wind source on a point.
///
/// The point must project inside the source segment and sit strictly in front
/// of it (along `direction`) and closer than `max_dist`; otherwise there is no
/// force.
pub fn wind_force(
    start: Vec2,
    end: Vec2,
    direction: Vec2,
    max_dist: f32,
    strength: f32,
    point: Vec2,
) -> Option<Vec2> {
    let line = end - start;
    let line_len_sq = line.length_squared();
    if line_len_sq == 0.0 {
        return None;
    }
    let rel = point - start;
    let t = rel.dot(line) / line_len_sq;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }

    let dist = rel.dot(direction);
    if dist <= 0.0 || dist >= max_dist {
        return None;
    }
    Some(direction * strength * wind_falloff(dist / max_dist))
}

/// Inward pull of a gravity well on a point, zero outside `radius`.
///
/// Grows quadratically with proximity:
/// `(0.2 + 0.8 * ratio^2) * strength * 1.5` with `ratio = 1 - dist / radius`.
pub fn well_pull(center: Vec2, radius: f32, strength: f32, point: Vec2) -> Option<Vec2> {
    let offset = point - center;
    let dist = offset.length();
    if dist >= radius {
        return None;
    }
    let ratio = 1.0 - dist / radius;
    let magnitude = (0.2 + 0.8 * ratio * ratio) * strength * 1.5;
    Some(-offset.normalize_or_zero() * magnitude)
}
