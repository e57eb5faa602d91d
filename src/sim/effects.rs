//! Decorative particle systems
//!
//! Nothing here feeds back into gameplay. Each wind zone and gravity well gets
//! one system; ripples and sparks are spawned on Perfect placements.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{Level, Zone, ZoneKind};

/// Streaks per wind zone
pub const WIND_STREAKS: usize = 45;
/// Motes per gravity well
pub const WELL_MOTES: usize = 60;
/// Sparks in a Perfect burst
pub const BURST_SPARKS: usize = 12;
/// Spark lifetime in frames
pub const SPARK_LIFE: u32 = 30;
/// Downward acceleration on sparks (px/frame^2)
pub const SPARK_GRAVITY: f32 = 0.2;
/// Ripple lifetime in frames
pub const RIPPLE_LIFE: u32 = 25;
/// Trail samples per wind streak
pub const WISP_SEGMENTS: usize = 6;

const RIPPLE_START_RADIUS: f32 = 10.0;
const RIPPLE_MAX_RADIUS: f32 = 120.0;
const STREAK_MIN_SPEED: f32 = 4.0;
const STREAK_SPEED_RANGE: f32 = 8.0;
const WISP_STEP: f32 = 4.0;
const GLOBAL_TIME_STEP: f32 = 0.05;

/// A single wind wisp travelling away from the source line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindStreak {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Frames left
    pub life: f32,
    pub max_life: f32,
    /// Sideways wave amplitude (px)
    pub amplitude: f32,
    pub frequency: f32,
    pub phase: f32,
    /// HSL colour, hue in degrees, saturation/lightness in 0..1
    pub hsl: [f32; 3],
    /// Stroke width
    pub size: f32,
}

impl WindStreak {
    fn spawn(start: Vec2, end: Vec2, direction: Vec2, max_dist: f32, rng: &mut impl Rng) -> Self {
        let origin = start.lerp(end, rng.random::<f32>());
        let speed = STREAK_MIN_SPEED + rng.random::<f32>() * STREAK_SPEED_RANGE;
        let max_life = max_dist / speed;
        // 0 for the slowest streaks, 1 for the fastest
        let fast = (speed - STREAK_MIN_SPEED) / STREAK_SPEED_RANGE;

        Self {
            pos: origin,
            vel: direction * speed,
            life: max_life,
            max_life,
            amplitude: (1.0 - fast) * 25.0 + 5.0,
            frequency: (1.0 - fast) * 0.15 + 0.05,
            phase: rng.random::<f32>() * std::f32::consts::TAU,
            hsl: [
                170.0 + rng.random::<f32>() * 50.0,
                0.7 + rng.random::<f32>() * 0.3,
                0.5 + fast * 0.4,
            ],
            size: 0.5 + fast * 2.5,
        }
    }
}

/// Streaks attached to one wind zone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindSystem {
    pub zone_id: u32,
    start: Vec2,
    end: Vec2,
    direction: Vec2,
    max_dist: f32,
    pub streaks: Vec<WindStreak>,
}

impl WindSystem {
    /// Build the system for a wind zone; `None` for any other zone kind
    pub fn for_zone(zone: &Zone, rng: &mut impl Rng) -> Option<Self> {
        let ZoneKind::Wind {
            start,
            end,
            direction,
            max_dist,
            ..
        } = zone.kind
        else {
            return None;
        };

        // Pre-age the streaks so the field looks established on the first frame
        let streaks = (0..WIND_STREAKS)
            .map(|_| {
                let mut s = WindStreak::spawn(start, end, direction, max_dist, rng);
                let progress = rng.random::<f32>();
                s.pos += s.vel * progress * s.max_life;
                s.life = s.max_life * (1.0 - progress);
                s
            })
            .collect();

        Some(Self {
            zone_id: zone.id,
            start,
            end,
            direction,
            max_dist,
            streaks,
        })
    }

    pub fn update(&mut self, rng: &mut impl Rng) {
        for streak in &mut self.streaks {
            streak.pos += streak.vel;
            streak.life -= 1.0;
            if streak.life <= 0.0 {
                *streak = WindStreak::spawn(self.start, self.end, self.direction, self.max_dist, rng);
            }
        }
    }

    /// Polyline of a streak's trailing wisp, head first
    pub fn wisp(&self, streak: &WindStreak, time: f32) -> [Vec2; WISP_SEGMENTS] {
        let normal = self.direction.perp();
        std::array::from_fn(|i| {
            let back = self.direction * (i as f32 * WISP_STEP);
            let age = (streak.max_life - streak.life - i as f32) * 0.2;
            let wave = ((time + age) * streak.frequency + streak.phase).sin() * streak.amplitude;
            streak.pos - back + normal * wave
        })
    }
}

/// A particle spiralling into a gravity well
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VortexMote {
    pub angle: f32,
    /// Distance from the well center
    pub radius: f32,
    pub speed: f32,
}

impl VortexMote {
    fn spawn(max_radius: f32, rng: &mut impl Rng) -> Self {
        Self {
            angle: rng.random::<f32>() * std::f32::consts::TAU,
            radius: max_radius,
            speed: 0.02 + rng.random::<f32>() * 0.03,
        }
    }
}

/// Motes orbiting one gravity well
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellSystem {
    pub zone_id: u32,
    pub center: Vec2,
    pub radius: f32,
    pub motes: Vec<VortexMote>,
}

impl WellSystem {
    pub fn for_zone(zone: &Zone, rng: &mut impl Rng) -> Option<Self> {
        let ZoneKind::Well { center, radius, .. } = zone.kind else {
            return None;
        };
        let motes = (0..WELL_MOTES)
            .map(|_| {
                let mut m = VortexMote::spawn(radius, rng);
                m.radius = rng.random::<f32>() * radius;
                m
            })
            .collect();
        Some(Self {
            zone_id: zone.id,
            center,
            radius,
            motes,
        })
    }

    pub fn update(&mut self, rng: &mut impl Rng) {
        for mote in &mut self.motes {
            mote.radius -= 0.5;
            // Spin up toward the center
            let spin = 1.0 + (1.0 - mote.radius / self.radius) * 2.0;
            mote.angle += mote.speed * spin;
            if mote.radius < 5.0 {
                *mote = VortexMote::spawn(self.radius, rng);
            }
        }
    }

    /// Absolute position of a mote
    pub fn mote_pos(&self, mote: &VortexMote) -> Vec2 {
        self.center + crate::unit_from_angle(mote.angle) * mote.radius
    }
}

/// Expanding ring shown on a Perfect placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ripple {
    pub center: Vec2,
    pub radius: f32,
    pub life: u32,
}

impl Ripple {
    pub fn new(center: Vec2) -> Self {
        Self {
            center,
            radius: RIPPLE_START_RADIUS,
            life: RIPPLE_LIFE,
        }
    }

    pub fn update(&mut self) {
        self.life = self.life.saturating_sub(1);
        let t = 1.0 - self.life as f32 / RIPPLE_LIFE as f32;
        let ease = 1.0 - (1.0 - t).powi(3);
        self.radius = RIPPLE_START_RADIUS + (RIPPLE_MAX_RADIUS - RIPPLE_START_RADIUS) * ease;
    }

    pub fn alpha(&self) -> f32 {
        self.life as f32 / RIPPLE_LIFE as f32
    }

    /// Inner white flash during the first fifth of the ripple
    pub fn flashing(&self) -> bool {
        self.life as f32 > RIPPLE_LIFE as f32 * 0.8
    }
}

/// Burst spark
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spark {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: u32,
    pub size: f32,
    /// Alternates gold and white
    pub gold: bool,
}

impl Spark {
    pub fn alpha(&self) -> f32 {
        self.life as f32 / SPARK_LIFE as f32
    }
}

/// All decorative state of a round
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Effects {
    /// Advances 0.05 per frame; drives wisp undulation
    pub global_time: f32,
    pub wind: Vec<WindSystem>,
    pub wells: Vec<WellSystem>,
    pub ripples: Vec<Ripple>,
    pub sparks: Vec<Spark>,
}

impl Effects {
    /// One system per zone of the level
    pub fn for_level(level: &Level, rng: &mut impl Rng) -> Self {
        let mut fx = Self::default();
        for zone in &level.zones {
            if let Some(sys) = WindSystem::for_zone(zone, rng) {
                fx.wind.push(sys);
            } else if let Some(sys) = WellSystem::for_zone(zone, rng) {
                fx.wells.push(sys);
            }
        }
        fx
    }

    pub fn update(&mut self, rng: &mut impl Rng) {
        self.global_time += GLOBAL_TIME_STEP;

        for sys in &mut self.wells {
            sys.update(rng);
        }
        for sys in &mut self.wind {
            sys.update(rng);
        }

        self.ripples.retain(|r| r.life > 0);
        for ripple in &mut self.ripples {
            ripple.update();
        }

        self.sparks.retain(|s| s.life > 0);
        for spark in &mut self.sparks {
            spark.pos += spark.vel;
            spark.life -= 1;
            spark.vel.y += SPARK_GRAVITY;
        }
    }

    /// Ripple plus a ring of sparks at `center`
    pub fn celebrate(&mut self, center: Vec2, rng: &mut impl Rng) {
        self.ripples.push(Ripple::new(center));
        for i in 0..BURST_SPARKS {
            let angle = std::f32::consts::TAU / BURST_SPARKS as f32 * i as f32;
            let speed = 4.0 + rng.random::<f32>() * 4.0;
            self.sparks.push(Spark {
                pos: center,
                vel: crate::unit_from_angle(angle) * speed,
                life: SPARK_LIFE,
                size: 3.0 + rng.random::<f32>() * 3.0,
                gold: i % 2 == 0,
            });
        }
    }
}
