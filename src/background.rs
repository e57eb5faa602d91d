//! Level backgrounds
//!
//! Each level picks one of the configured images at random and cover-fits it
//! once the host reports it loaded. Until then (and forever, if loading fails
//! or no images are configured) a procedural sky-and-hills scene is shown, so
//! level start never waits on an image.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::renderer::{Color, colors};
use crate::sim::geometry::Rect;

/// Horizontal sampling step of hill outlines (px)
pub const HILL_STEP: f32 = 10.0;
/// Puffs drawn in the sky
pub const CLOUD_COUNT: usize = 8;

/// Destination rect that covers `canvas` with an image of size `image`,
/// preserving aspect ratio and centering the overflow.
pub fn cover_fit(canvas: Vec2, image: Vec2) -> Rect {
    let image_ratio = image.x / image.y;
    let canvas_ratio = canvas.x / canvas.y;

    if canvas_ratio > image_ratio {
        let h = canvas.x / image_ratio;
        Rect::new(0.0, (canvas.y - h) / 2.0, canvas.x, h)
    } else {
        let w = canvas.y * image_ratio;
        Rect::new((canvas.x - w) / 2.0, 0.0, w, canvas.y)
    }
}

/// Three overlapping circles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cloud {
    pub center: Vec2,
    pub radius: f32,
}

impl Cloud {
    /// (center, radius) of each puff
    pub fn puffs(&self) -> [(Vec2, f32); 3] {
        let r = self.radius;
        [
            (self.center, r),
            (self.center + Vec2::new(r * 0.6, -r * 0.3), r * 0.8),
            (self.center + Vec2::new(r * 1.2, 0.0), r * 0.7),
        ]
    }
}

/// A sine-wave hill band filled down to the bottom edge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hill {
    pub base_y: f32,
    pub amplitude: f32,
    pub frequency: f32,
    pub color: Color,
}

impl Hill {
    /// Closed outline: bottom-left, ridge samples left to right, bottom-right
    pub fn outline(&self, size: Vec2) -> Vec<Vec2> {
        let samples = (size.x / HILL_STEP).floor() as usize;
        let mut points = Vec::with_capacity(samples + 4);
        points.push(Vec2::new(0.0, size.y));
        for i in 0..=samples {
            let x = i as f32 * HILL_STEP;
            points.push(Vec2::new(x, self.base_y + (x * self.frequency).sin() * self.amplitude));
        }
        points.push(Vec2::new(size.x, size.y));
        points
    }
}

/// Procedural cartoon landscape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Vertical gradient stops (offset 0-1, colour)
    pub sky: Vec<(f32, Color)>,
    pub clouds: Vec<Cloud>,
    /// Back to front
    pub hills: Vec<Hill>,
}

impl Scene {
    pub fn generate(size: Vec2, rng: &mut impl Rng) -> Self {
        let clouds = (0..CLOUD_COUNT)
            .map(|_| Cloud {
                center: Vec2::new(
                    rng.random::<f32>() * size.x,
                    rng.random::<f32>() * size.y * 0.4,
                ),
                radius: 30.0 + rng.random::<f32>() * 40.0,
            })
            .collect();

        let hills = vec![
            Hill {
                base_y: size.y * 0.5,
                amplitude: 40.0,
                frequency: 0.005,
                color: colors::HILL_BACK,
            },
            Hill {
                base_y: size.y * 0.65,
                amplitude: 30.0,
                frequency: 0.008,
                color: colors::HILL_MID,
            },
            Hill {
                base_y: size.y * 0.8,
                amplitude: 20.0,
                frequency: 0.012,
                color: colors::HILL_FRONT,
            },
        ];

        Self {
            sky: vec![
                (0.0, colors::SKY_TOP),
                (0.6, colors::SKY_MID),
                (1.0, colors::SKY_BOTTOM),
            ],
            clouds,
            hills,
        }
    }
}

/// What the background currently shows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BackgroundState {
    /// Waiting on the host; a flat sky fill stands in
    Loading { source: String },
    /// Image drawn at `dest`
    Image { source: String, dest: Rect },
    Procedural(Scene),
}

/// Background of one level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Background {
    pub size: Vec2,
    pub state: BackgroundState,
}

impl Background {
    /// Pick an image uniformly, or go procedural when none are configured
    pub fn choose(images: &[String], size: Vec2, rng: &mut impl Rng) -> Self {
        let state = if images.is_empty() {
            BackgroundState::Procedural(Scene::generate(size, rng))
        } else {
            let source = images[rng.random_range(0..images.len())].clone();
            log::debug!("Background image requested: {source}");
            BackgroundState::Loading { source }
        };
        Self { size, state }
    }

    /// Image the host should start loading, if any
    pub fn pending_image(&self) -> Option<&str> {
        match &self.state {
            BackgroundState::Loading { source } => Some(source),
            _ => None,
        }
    }

    /// Host finished loading `source` with the given pixel size.
    /// Reports for anything other than the pending image are ignored.
    pub fn on_image_loaded(&mut self, source: &str, image_size: Vec2, rng: &mut impl Rng) {
        if self.pending_image() != Some(source) {
            log::debug!("Ignoring stale background load: {source}");
            return;
        }
        if image_size.x <= 0.0 || image_size.y <= 0.0 {
            log::warn!("Background image {source} has no pixels, using procedural scene");
            self.state = BackgroundState::Procedural(Scene::generate(self.size, rng));
            return;
        }
        self.state = BackgroundState::Image {
            source: source.to_string(),
            dest: cover_fit(self.size, image_size),
        };
    }

    /// Host failed to load `source`
    pub fn on_image_failed(&mut self, source: &str, rng: &mut impl Rng) {
        if self.pending_image() != Some(source) {
            return;
        }
        log::warn!("Background image {source} failed to load, using procedural scene");
        self.state = BackgroundState::Procedural(Scene::generate(self.size, rng));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const CANVAS: Vec2 = Vec2::new(450.0, 800.0);

    #[test]
    fn test_cover_fit_wide_image() {
        // Wider than the canvas: full height, cropped sides
        let r = cover_fit(CANVAS, Vec2::new(1600.0, 900.0));
        assert_eq!(r.size.y, 800.0);
        assert!((r.size.x - 800.0 * 16.0 / 9.0).abs() < 1e-3);
        assert!((r.min.x - (450.0 - r.size.x) / 2.0).abs() < 1e-3);
        assert_eq!(r.min.y, 0.0);
    }

    #[test]
    fn test_cover_fit_tall_image() {
        let r = cover_fit(Vec2::new(800.0, 450.0), Vec2::new(900.0, 1600.0));
        assert_eq!(r.size.x, 800.0);
        assert_eq!(r.min.x, 0.0);
        assert!(r.min.y < 0.0);
        assert!((r.center().y - 225.0).abs() < 1e-3);
    }

    #[test]
    fn test_empty_list_is_procedural() {
        let mut rng = Pcg32::seed_from_u64(1);
        let bg = Background::choose(&[], CANVAS, &mut rng);
        let BackgroundState::Procedural(scene) = &bg.state else {
            panic!("expected procedural scene");
        };
        assert_eq!(scene.clouds.len(), CLOUD_COUNT);
        assert_eq!(scene.hills.len(), 3);
        assert!(bg.pending_image().is_none());
        for c in &scene.clouds {
            assert!(c.center.y <= CANVAS.y * 0.4);
            assert!((30.0..=70.0).contains(&c.radius));
        }
    }

    #[test]
    fn test_load_then_fit() {
        let mut rng = Pcg32::seed_from_u64(2);
        let images = vec!["a.png".to_string(), "b.png".to_string()];
        let mut bg = Background::choose(&images, CANVAS, &mut rng);
        let source = bg.pending_image().unwrap().to_string();
        assert!(images.contains(&source));

        bg.on_image_loaded("other.png", Vec2::new(100.0, 100.0), &mut rng);
        assert!(bg.pending_image().is_some(), "stale report ignored");

        bg.on_image_loaded(&source, Vec2::new(1000.0, 1000.0), &mut rng);
        let BackgroundState::Image { dest, .. } = &bg.state else {
            panic!("expected image");
        };
        assert_eq!(dest.size, Vec2::new(800.0, 800.0));
    }

    #[test]
    fn test_failure_falls_back() {
        let mut rng = Pcg32::seed_from_u64(3);
        let images = vec!["only.png".to_string()];
        let mut bg = Background::choose(&images, CANVAS, &mut rng);
        bg.on_image_failed("only.png", &mut rng);
        assert!(matches!(bg.state, BackgroundState::Procedural(_)));
    }

    #[test]
    fn test_hill_outline_is_closed_to_bottom() {
        let hill = Hill {
            base_y: 400.0,
            amplitude: 40.0,
            frequency: 0.005,
            color: colors::HILL_BACK,
        };
        let pts = hill.outline(CANVAS);
        assert_eq!(pts.first(), Some(&Vec2::new(0.0, 800.0)));
        assert_eq!(pts.last(), Some(&Vec2::new(450.0, 800.0)));
        assert_eq!(pts.len(), 46 + 2);
    }
}
