//! Path construction for piece and silhouette outlines

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_3, TAU};

use crate::sim::ShapeKind;
use crate::sim::geometry::Rect;

/// Corner radius of square pieces
pub const SQUARE_CORNER_RADIUS: f32 = 12.0;
/// Jigsaw tab depth as a fraction of the piece width
pub const TAB_FRACTION: f32 = 0.25;

/// Canvas-style path segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathOp {
    MoveTo(Vec2),
    LineTo(Vec2),
    /// Cubic bezier from the current point
    BezierTo { c1: Vec2, c2: Vec2, to: Vec2 },
    /// Clockwise arc, angles in radians
    Arc {
        center: Vec2,
        radius: f32,
        start: f32,
        end: f32,
    },
    RoundRect { rect: Rect, radius: f32 },
    Close,
}

/// Outline of `shape` fitted to `rect`
pub fn shape_path(shape: ShapeKind, rect: Rect) -> Vec<PathOp> {
    let Vec2 { x, y } = rect.min;
    let Vec2 { x: w, y: h } = rect.size;
    let c = rect.center();
    let r = w / 2.0;

    match shape {
        ShapeKind::Circle => vec![PathOp::Arc {
            center: c,
            radius: r,
            start: 0.0,
            end: TAU,
        }],
        ShapeKind::Triangle => polygon(&[
            Vec2::new(c.x, y),
            Vec2::new(x + w, y + h),
            Vec2::new(x, y + h),
        ]),
        ShapeKind::Hexagon => {
            let corners: Vec<Vec2> = (0..6)
                .map(|i| c + crate::unit_from_angle(FRAC_PI_3 * i as f32) * r)
                .collect();
            polygon(&corners)
        }
        ShapeKind::PuzzleClassic => jigsaw(rect),
        ShapeKind::Square => vec![PathOp::RoundRect {
            rect,
            radius: SQUARE_CORNER_RADIUS,
        }],
    }
}

/// Square with a tab bulging out of the top and right edges and notched into
/// the bottom and left ones
fn jigsaw(rect: Rect) -> Vec<PathOp> {
    let Vec2 { x, y } = rect.min;
    let Vec2 { x: w, y: h } = rect.size;
    let tab = w * TAB_FRACTION;
    let p = Vec2::new;

    vec![
        PathOp::MoveTo(p(x, y)),
        PathOp::LineTo(p(x + w * 0.35, y)),
        PathOp::BezierTo {
            c1: p(x + w * 0.35, y - tab),
            c2: p(x + w * 0.65, y - tab),
            to: p(x + w * 0.65, y),
        },
        PathOp::LineTo(p(x + w, y)),
        PathOp::LineTo(p(x + w, y + h * 0.35)),
        PathOp::BezierTo {
            c1: p(x + w + tab, y + h * 0.35),
            c2: p(x + w + tab, y + h * 0.65),
            to: p(x + w, y + h * 0.65),
        },
        PathOp::LineTo(p(x + w, y + h)),
        PathOp::LineTo(p(x + w * 0.65, y + h)),
        PathOp::BezierTo {
            c1: p(x + w * 0.65, y + h - tab),
            c2: p(x + w * 0.35, y + h - tab),
            to: p(x + w * 0.35, y + h),
        },
        PathOp::LineTo(p(x, y + h)),
        PathOp::LineTo(p(x, y + h * 0.65)),
        PathOp::BezierTo {
            c1: p(x + tab, y + h * 0.65),
            c2: p(x + tab, y + h * 0.35),
            to: p(x, y + h * 0.35),
        },
        PathOp::Close,
    ]
}

/// Open polyline through `points`
pub fn polyline(points: &[Vec2]) -> Vec<PathOp> {
    let mut ops = Vec::with_capacity(points.len());
    let mut iter = points.iter();
    if let Some(&first) = iter.next() {
        ops.push(PathOp::MoveTo(first));
        ops.extend(iter.map(|&p| PathOp::LineTo(p)));
    }
    ops
}

/// Closed polygon through `points`
pub fn polygon(points: &[Vec2]) -> Vec<PathOp> {
    let mut ops = polyline(points);
    if !ops.is_empty() {
        ops.push(PathOp::Close);
    }
    ops
}

/// Line segment
pub fn segment(a: Vec2, b: Vec2) -> Vec<PathOp> {
    vec![PathOp::MoveTo(a), PathOp::LineTo(b)]
}
