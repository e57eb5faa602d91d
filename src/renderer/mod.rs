//! Backend-agnostic rendering
//!
//! Each frame the game is flattened into a display list of Canvas-2D style
//! commands tagged with a `Layer`. The list is rebuilt from scratch every frame
//! and is already in draw order; hosts replay it front to back onto whatever
//! surface they own.

pub mod display_list;
pub mod shapes;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::geometry::Rect;

pub use display_list::build_display_list;
pub use shapes::{PathOp, shape_path};

/// Straight RGBA, components in 0..1
pub type Color = [f32; 4];

/// `0xRRGGBB` plus alpha
pub const fn hex(rgb: u32, alpha: f32) -> Color {
    [
        ((rgb >> 16) & 0xff) as f32 / 255.0,
        ((rgb >> 8) & 0xff) as f32 / 255.0,
        (rgb & 0xff) as f32 / 255.0,
        alpha,
    ]
}

/// HSL colour (hue in degrees, saturation and lightness in 0..1) to RGBA
pub fn hsla(h: f32, s: f32, l: f32, alpha: f32) -> Color {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    [r + m, g + m, b + m, alpha]
}

/// Colors for game elements
pub mod colors {
    use super::{Color, hex};

    pub const SKY_TOP: Color = hex(0x60a5fa, 1.0);
    pub const SKY_MID: Color = hex(0xbfdbfe, 1.0);
    pub const SKY_BOTTOM: Color = hex(0xe0f2fe, 1.0);
    pub const CLOUD: Color = [1.0, 1.0, 1.0, 0.8];
    pub const HILL_BACK: Color = hex(0x4ade80, 1.0);
    pub const HILL_MID: Color = hex(0x22c55e, 1.0);
    pub const HILL_FRONT: Color = hex(0x16a34a, 1.0);
    /// Wash over photo backgrounds
    pub const IMAGE_TINT: Color = [1.0, 1.0, 1.0, 0.1];
    pub const WALL_WARNING: Color = hex(0xef4444, 0.4);

    pub const WIND_SOURCE_EDGE: Color = hex(0x475569, 1.0);
    pub const WIND_SOURCE_LIGHT: Color = hex(0xcbd5e1, 1.0);
    pub const WIND_SOURCE_SHINE: Color = hex(0xf1f5f9, 1.0);
    pub const WELL_CORE: Color = [0.0, 0.0, 0.0, 1.0];

    pub const SPIKE: Color = hex(0xff3333, 1.0);
    pub const BALL: Color = hex(0xdc2626, 1.0);
    pub const BALL_SHINE: Color = [1.0, 1.0, 1.0, 0.6];
    pub const BALL_SHADOW: Color = [0.0, 0.0, 0.0, 0.5];

    pub const SILHOUETTE: Color = [0.0, 0.0, 0.0, 0.4];
    pub const ACCENT: Color = hex(0xfbbf24, 1.0);
    pub const PIECE_RIM: Color = [1.0, 1.0, 1.0, 0.4];
    pub const PIECE_SHADOW: Color = [0.0, 0.0, 0.0, 0.35];
    pub const PIECE_SHEEN: Color = [1.0, 1.0, 1.0, 0.25];
    pub const PIECE_SHADE: Color = [0.0, 0.0, 0.0, 0.15];
    pub const LINK_GUIDE: Color = [1.0, 1.0, 1.0, 0.4];

    pub const RIPPLE: Color = hex(0xfde047, 1.0);
    pub const FLASH: Color = [1.0, 1.0, 1.0, 0.8];
    pub const SPARK_GOLD: Color = hex(0xfbbf24, 1.0);
    pub const SPARK_WHITE: Color = [1.0, 1.0, 1.0, 1.0];
    pub const TRANSPARENT: Color = [0.0, 0.0, 0.0, 0.0];
}

/// Draw layers, bottom to top
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Layer {
    Background,
    WellParticles,
    WindParticles,
    ZoneSources,
    StaticHazards,
    Silhouettes,
    Pieces,
    DynamicHazards,
    Effects,
}

/// Compositing mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Blend {
    #[default]
    Normal,
    /// `lighter`
    Additive,
    Screen,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Paint {
    Solid(Color),
    LinearGradient {
        from: Vec2,
        to: Vec2,
        /// (offset 0-1, colour)
        stops: Vec<(f32, Color)>,
    },
}

impl From<Color> for Paint {
    fn from(c: Color) -> Self {
        Paint::Solid(c)
    }
}

/// Drop shadow / glow
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub color: Color,
    pub blur: f32,
    pub offset: Vec2,
}

impl Shadow {
    pub fn glow(color: Color, blur: f32) -> Self {
        Self {
            color,
            blur,
            offset: Vec2::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub width: f32,
    /// Dash and gap lengths; solid when `None`
    pub dash: Option<[f32; 2]>,
    pub round_cap: bool,
}

impl Stroke {
    pub fn solid(width: f32) -> Self {
        Self {
            width,
            dash: None,
            round_cap: false,
        }
    }

    pub fn dashed(width: f32, dash: f32, gap: f32) -> Self {
        Self {
            width,
            dash: Some([dash, gap]),
            round_cap: false,
        }
    }
}

/// One drawing operation in canvas pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCmd {
    FillRect {
        rect: Rect,
        paint: Paint,
    },
    StrokeRect {
        rect: Rect,
        paint: Paint,
        stroke: Stroke,
    },
    /// Host-loaded image scaled into `dest`
    Image {
        source: String,
        dest: Rect,
    },
    FillCircle {
        center: Vec2,
        radius: f32,
        paint: Paint,
    },
    StrokeCircle {
        center: Vec2,
        radius: f32,
        paint: Paint,
        stroke: Stroke,
    },
    FillPath {
        path: Vec<PathOp>,
        paint: Paint,
    },
    StrokePath {
        path: Vec<PathOp>,
        paint: Paint,
        stroke: Stroke,
    },
    /// Copy the `src` region of the already drawn background into `dest`,
    /// clipped to `clip`
    BackgroundCutout {
        clip: Vec<PathOp>,
        src: Rect,
        dest: Rect,
    },
}

/// A command with its layer and compositing state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayItem {
    pub layer: Layer,
    pub blend: Blend,
    /// Multiplied into every colour of the command
    pub alpha: f32,
    pub shadow: Option<Shadow>,
    pub cmd: DrawCmd,
}

impl DisplayItem {
    pub fn new(layer: Layer, cmd: DrawCmd) -> Self {
        Self {
            layer,
            blend: Blend::Normal,
            alpha: 1.0,
            shadow: None,
            cmd,
        }
    }

    pub fn with_blend(mut self, blend: Blend) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn with_shadow(mut self, shadow: Shadow) -> Self {
        self.shadow = Some(shadow);
        self
    }
}
