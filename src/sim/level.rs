//! Level generation
//!
//! Difficulty comes from a fixed table keyed by level index; layout comes from
//! bounded rejection sampling. Each entity class samples uniformly inside a
//! margined play area and keeps the first candidate that clears its safety
//! distance. Pieces and silhouettes keep their last candidate when the attempt
//! cap runs out; hazards and zones that never find a safe spot are left out.

use glam::Vec2;
use rand::Rng;

use super::geometry::dist_point_to_segment;
use super::state::{
    Level, LevelConfig, Obstacle, ObstacleKind, Piece, ShapeKind, Silhouette, SilhouetteTarget,
    Zone, ZoneKind,
};
use crate::consts::*;
use crate::rotate_about;
use crate::settings::GameConfig;

/// Attempts per hazard/zone/decoy candidate
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 100;
/// Attempts when separating a silhouette group from its piece group
pub const MAX_TARGET_ATTEMPTS: u32 = 50;
/// Attempts for decoy silhouettes
pub const MAX_DECOY_ATTEMPTS: u32 = 20;

/// Minimum distance between a piece group and its silhouette group
const TARGET_SEPARATION: f32 = 150.0;
/// Extra gap (beyond one piece) between linked partners
const LINK_MIN_EXTRA_GAP: f32 = 80.0;
/// Upper bound on the linked-partner offset
const LINK_MAX_GAP: f32 = 250.0;
/// Wind source line must stay this far from piece/silhouette centers
const WIND_CLEARANCE: f32 = 60.0;
/// Wind source line length range
const WIND_MIN_LENGTH: f32 = 150.0;
const WIND_LENGTH_RANGE: f32 = 100.0;
/// Random tilt applied to a wind line (radians, +/- half of this)
const WIND_JITTER: f32 = 0.2;
/// Well center must stay this far from piece/silhouette centers
const WELL_CLEARANCE: f32 = 70.0;
/// Spike clearance from piece/silhouette centers (plus the anchor's half-width)
const SPIKE_CLEARANCE: f32 = 50.0;
/// Spike clearance from already-placed obstacles
const SPIKE_SPACING: f32 = 40.0;
/// Ball spawn clearance from piece centers
const BALL_SPAWN_CLEARANCE: f32 = 80.0;

/// Round time budget in seconds
pub fn time_limit_for(level: u32) -> f32 {
    let base = if level <= 10 {
        5.0
    } else {
        6.0 - (level / 5) as f32 * 0.5
    };
    base.max(3.0)
}

/// Difficulty table. Levels 26+ roll for a linked pair and a hazard mix.
pub fn level_config(level: u32, rng: &mut impl Rng) -> LevelConfig {
    let mut config = LevelConfig {
        level,
        time_limit: time_limit_for(level),
        pieces: 1,
        fake_silhouettes: 0,
        static_spikes: match level {
            0..=5 => 1,
            6..=10 => 2,
            11..=20 => 3,
            _ => 4,
        },
        dynamic_spikes: 0,
        wind_zones: 0,
        gravity_wells: 0,
        linked_pieces: false,
    };

    if level >= 6 {
        config.fake_silhouettes = 1;
    }

    if level >= 10 {
        config.dynamic_spikes = (1 + (level - 10) / 3).min(3);
    }

    if (16..=20).contains(&level) {
        config.wind_zones = 1;
    }

    if (21..=25).contains(&level) {
        config.gravity_wells = 1;
    }

    if level >= 26 {
        if rng.random_bool(0.5) {
            config.linked_pieces = true;
            config.pieces = 2;
            // Decoys would overcrowd a two-piece board
            config.fake_silhouettes = 0;
        }

        let hazards = if level <= 30 {
            rng.random_range(1..=2)
        } else {
            rng.random_range(2..=3)
        };
        for _ in 0..hazards {
            if rng.random_bool(0.5) {
                config.wind_zones += 1;
            } else {
                config.gravity_wells += 1;
            }
        }

        config.dynamic_spikes = if level <= 30 { 2 } else { 3 };
    }

    config
}

/// Build every entity of a level sized to `bounds`
pub fn generate_level(
    config: &LevelConfig,
    bounds: Vec2,
    game: &GameConfig,
    rng: &mut impl Rng,
) -> Level {
    let mut level = Level::empty(config.clone(), bounds);

    place_pieces(&mut level, game, rng);
    place_decoys(&mut level, game, rng);
    let winds = place_wind_zones(&mut level, rng);
    let wells = place_wells(&mut level, rng);
    let spikes = place_static_spikes(&mut level, rng);
    let balls = place_dynamic_balls(&mut level, rng);

    log::info!(
        "Level {}: time={}s pieces={} decoys={} wind={}/{} wells={}/{} spikes={}/{} balls={}/{}",
        config.level,
        config.time_limit,
        level.pieces.len(),
        config.fake_silhouettes,
        winds,
        config.wind_zones,
        wells,
        config.gravity_wells,
        spikes,
        config.static_spikes,
        balls,
        config.dynamic_spikes,
    );

    level
}

/// Uniform coordinate on one axis inside `margin`, leaving room for `span`
fn sample_axis(rng: &mut impl Rng, margin: f32, extent: f32, span: f32) -> f32 {
    margin + rng.random::<f32>() * (extent - margin * 2.0 - span).max(0.0)
}

fn sample_point(rng: &mut impl Rng, margin: f32, bounds: Vec2, span: Vec2) -> Vec2 {
    Vec2::new(
        sample_axis(rng, margin, bounds.x, span.x),
        sample_axis(rng, margin, bounds.y, span.y),
    )
}

/// Pieces first, each with its silhouette group at a separate location
fn place_pieces(level: &mut Level, game: &GameConfig, rng: &mut impl Rng) {
    let size = game.piece_size;
    let bounds = level.bounds;
    let count = level.config.pieces;
    let linked_level = level.config.linked_pieces;

    let mut i = 0;
    while i < count {
        let linked = linked_level && i % 2 == 0 && i + 1 < count;

        // Offset of the partner's top-left relative to the first piece
        let offset = if linked {
            let min_gap = size + LINK_MIN_EXTRA_GAP;
            let max_gap = (bounds.x * 0.4).min(LINK_MAX_GAP).max(min_gap);
            let gap = min_gap + rng.random::<f32>() * (max_gap - min_gap);
            crate::unit_from_angle(rng.random::<f32>() * std::f32::consts::TAU) * gap
        } else {
            Vec2::ZERO
        };
        let group_span = Vec2::splat(size) + offset.abs();
        // Shift so the whole group starts at the sampled corner
        let lead = Vec2::new((-offset.x).max(0.0), (-offset.y).max(0.0));

        let group_pos = sample_point(rng, PIECE_MARGIN, bounds, group_span);

        let mut target_pos = sample_point(rng, PIECE_MARGIN, bounds, group_span);
        let mut attempts = 1;
        while target_pos.distance(group_pos) <= TARGET_SEPARATION && attempts < MAX_TARGET_ATTEMPTS
        {
            target_pos = sample_point(rng, PIECE_MARGIN, bounds, group_span);
            attempts += 1;
        }
        if target_pos.distance(group_pos) <= TARGET_SEPARATION {
            log::debug!("Silhouette group fell back after {attempts} attempts");
        }

        let first_id = level.next_entity_id();
        let partner_id = linked.then(|| level.next_entity_id());

        let first_shape = ShapeKind::random(rng);
        level.pieces.push(Piece {
            id: first_id,
            pos: group_pos + lead,
            size,
            shape: first_shape,
            touched: false,
            linked: partner_id,
        });
        let first_sil = level.next_entity_id();
        level.silhouettes.push(Silhouette {
            id: first_sil,
            pos: target_pos + lead,
            size,
            shape: first_shape,
            target: SilhouetteTarget::Piece(first_id),
        });

        if let Some(partner_id) = partner_id {
            let partner_shape = ShapeKind::random(rng);
            level.pieces.push(Piece {
                id: partner_id,
                pos: group_pos + lead + offset,
                size,
                shape: partner_shape,
                touched: false,
                linked: Some(first_id),
            });
            let partner_sil = level.next_entity_id();
            level.silhouettes.push(Silhouette {
                id: partner_sil,
                pos: target_pos + lead + offset,
                size,
                shape: partner_shape,
                target: SilhouetteTarget::Piece(partner_id),
            });
            i += 2;
        } else {
            i += 1;
        }
    }
}

/// Decoy silhouettes: keep clear of existing outlines when possible
fn place_decoys(level: &mut Level, game: &GameConfig, rng: &mut impl Rng) {
    let size = game.piece_size;
    let span = Vec2::splat(size);
    for _ in 0..level.config.fake_silhouettes {
        let mut pos = sample_point(rng, PIECE_MARGIN, level.bounds, span);
        for _ in 1..MAX_DECOY_ATTEMPTS {
            let center = pos + span / 2.0;
            if level
                .anchor_centers()
                .all(|(c, _)| c.distance(center) >= size)
            {
                break;
            }
            pos = sample_point(rng, PIECE_MARGIN, level.bounds, span);
        }

        let id = level.next_entity_id();
        level.silhouettes.push(Silhouette {
            id,
            pos,
            size,
            shape: ShapeKind::random(rng),
            target: SilhouetteTarget::Fake,
        });
    }
}

/// Wind sources: a jittered horizontal or vertical line blowing away from
/// the near wall toward the canvas center.
fn place_wind_zones(level: &mut Level, rng: &mut impl Rng) -> u32 {
    let bounds = level.bounds;
    let max_dist = bounds.x * WIND_REACH_FRACTION;
    let mut placed = 0;

    for _ in 0..level.config.wind_zones {
        let mut found = None;
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let length = WIND_MIN_LENGTH + rng.random::<f32>() * WIND_LENGTH_RANGE;
            let (a, b, push) = if rng.random_bool(0.5) {
                let x1 = sample_axis(rng, PLAY_MARGIN, bounds.x, length);
                let y1 = sample_axis(rng, PLAY_MARGIN, bounds.y, 0.0);
                let push = Vec2::new(0.0, if y1 < bounds.y / 2.0 { 1.0 } else { -1.0 });
                (Vec2::new(x1, y1), Vec2::new(x1 + length, y1), push)
            } else {
                let x1 = sample_axis(rng, PLAY_MARGIN, bounds.x, 0.0);
                let y1 = sample_axis(rng, PLAY_MARGIN, bounds.y, length);
                let push = Vec2::new(if x1 < bounds.x / 2.0 { 1.0 } else { -1.0 }, 0.0);
                (Vec2::new(x1, y1), Vec2::new(x1, y1 + length), push)
            };

            let mid = (a + b) / 2.0;
            let tilt = (rng.random::<f32>() - 0.5) * WIND_JITTER;
            let start = rotate_about(a, mid, tilt);
            let end = rotate_about(b, mid, tilt);

            let clear = level
                .anchor_centers()
                .all(|(c, _)| dist_point_to_segment(c, start, end) >= WIND_CLEARANCE);
            if !clear {
                continue;
            }

            let mut direction = (end - start).perp().normalize_or_zero();
            if direction.dot(push) < 0.0 {
                direction = -direction;
            }
            found = Some(ZoneKind::Wind {
                start,
                end,
                direction,
                max_dist,
                strength: WIND_STRENGTH,
            });
            break;
        }

        match found {
            Some(kind) => {
                let id = level.next_entity_id();
                level.zones.push(Zone { id, kind });
                placed += 1;
            }
            None => log::debug!("Wind zone dropped after {MAX_PLACEMENT_ATTEMPTS} attempts"),
        }
    }
    placed
}

/// Gravity wells: only the center is constrained; the pull radius may cover pieces
fn place_wells(level: &mut Level, rng: &mut impl Rng) -> u32 {
    let mut placed = 0;
    for _ in 0..level.config.gravity_wells {
        let found = (0..MAX_PLACEMENT_ATTEMPTS)
            .map(|_| sample_point(rng, PLAY_MARGIN, level.bounds, Vec2::ZERO))
            .find(|&c| {
                level
                    .anchor_centers()
                    .all(|(anchor, _)| anchor.distance(c) >= WELL_CLEARANCE)
            });

        match found {
            Some(center) => {
                let id = level.next_entity_id();
                level.zones.push(Zone {
                    id,
                    kind: ZoneKind::Well {
                        center,
                        radius: WELL_RADIUS,
                        strength: WELL_STRENGTH,
                    },
                });
                placed += 1;
            }
            None => log::debug!("Gravity well dropped after {MAX_PLACEMENT_ATTEMPTS} attempts"),
        }
    }
    placed
}

/// Static spikes keep clear of outlines and of each other; zones may overlap them
fn place_static_spikes(level: &mut Level, rng: &mut impl Rng) -> u32 {
    let mut placed = 0;
    for _ in 0..level.config.static_spikes {
        let found = (0..MAX_PLACEMENT_ATTEMPTS)
            .map(|_| sample_point(rng, PLAY_MARGIN, level.bounds, Vec2::ZERO))
            .find(|&p| {
                level
                    .anchor_centers()
                    .all(|(c, half)| c.distance(p) >= SPIKE_CLEARANCE + half)
                    && level
                        .obstacles
                        .iter()
                        .all(|o| o.pos.distance(p) >= SPIKE_SPACING)
            });

        match found {
            Some(pos) => {
                let id = level.next_entity_id();
                level.obstacles.push(Obstacle {
                    id,
                    kind: ObstacleKind::StaticSpike,
                    pos,
                    size: SPIKE_SIZE,
                    vel: Vec2::ZERO,
                });
                placed += 1;
            }
            None => log::debug!("Static spike dropped after {MAX_PLACEMENT_ATTEMPTS} attempts"),
        }
    }
    placed
}

/// Ball speed in px/frame: mean of three uniforms mapped into a level band
pub fn ball_speed(level: u32, rng: &mut impl Rng) -> f32 {
    let bell = (rng.random::<f32>() + rng.random::<f32>() + rng.random::<f32>()) / 3.0;
    let (min_speed, range) = if level <= 15 { (3.0, 3.0) } else { (1.5, 9.0) };
    min_speed + bell * range
}

/// Simulate a ball's bouncing path and report whether it stays clear of every piece
pub fn trajectory_is_safe(ball: &Obstacle, pieces: &[Piece], bounds: Vec2) -> bool {
    let mut probe = ball.clone();
    for _ in 0..TRAJECTORY_FRAMES {
        probe.advance(bounds);
        let endangers = pieces.iter().any(|p| {
            p.center().distance(probe.pos) < probe.radius() + p.radius() + TRAJECTORY_BUFFER
        });
        if endangers {
            return false;
        }
    }
    true
}

/// Dynamic balls: safe spawn point and a safe opening trajectory
fn place_dynamic_balls(level: &mut Level, rng: &mut impl Rng) -> u32 {
    let mut placed = 0;
    for _ in 0..level.config.dynamic_spikes {
        let mut found = None;
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let pos = sample_point(rng, BALL_SPAWN_MARGIN, level.bounds, Vec2::ZERO);
            if level
                .pieces
                .iter()
                .any(|p| p.center().distance(pos) < BALL_SPAWN_CLEARANCE)
            {
                continue;
            }

            let speed = ball_speed(level.config.level, rng);
            let heading = rng.random::<f32>() * std::f32::consts::TAU;
            let candidate = Obstacle {
                id: 0,
                kind: ObstacleKind::DynamicBall,
                pos,
                size: BALL_SIZE,
                vel: crate::unit_from_angle(heading) * speed,
            };
            if trajectory_is_safe(&candidate, &level.pieces, level.bounds) {
                found = Some(candidate);
                break;
            }
        }

        match found {
            Some(mut ball) => {
                ball.id = level.next_entity_id();
                level.obstacles.push(ball);
                placed += 1;
            }
            None => log::debug!("Dynamic ball dropped after {MAX_PLACEMENT_ATTEMPTS} attempts"),
        }
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const CANVAS: Vec2 = Vec2::new(450.0, 800.0);

    fn rng(seed: u64) -> Pcg32 {
        Pcg32::seed_from_u64(seed)
    }

    #[test]
    fn test_time_limits() {
        assert_eq!(time_limit_for(1), 5.0);
        assert_eq!(time_limit_for(10), 5.0);
        // floor(11/5) = 2 -> 6.0 - 1.0
        assert_eq!(time_limit_for(11), 5.0);
        assert_eq!(time_limit_for(15), 4.5);
        assert_eq!(time_limit_for(20), 4.0);
        assert_eq!(time_limit_for(25), 3.5);
        assert_eq!(time_limit_for(30), 3.0);
        assert_eq!(time_limit_for(60), 3.0);
    }

    #[test]
    fn test_spike_and_decoy_tiers() {
        let mut r = rng(1);
        let counts: Vec<u32> = [1, 5, 6, 10, 11, 20, 21]
            .iter()
            .map(|&l| level_config(l, &mut r).static_spikes)
            .collect();
        assert_eq!(counts, vec![1, 1, 2, 2, 3, 3, 4]);

        assert_eq!(level_config(5, &mut r).fake_silhouettes, 0);
        assert_eq!(level_config(6, &mut r).fake_silhouettes, 1);
        assert_eq!(level_config(25, &mut r).fake_silhouettes, 1);
    }

    #[test]
    fn test_dynamic_spike_ramp() {
        let mut r = rng(2);
        let counts: Vec<u32> = [9, 10, 12, 13, 16, 19, 25]
            .iter()
            .map(|&l| level_config(l, &mut r).dynamic_spikes)
            .collect();
        assert_eq!(counts, vec![0, 1, 1, 2, 3, 3, 3]);
    }

    #[test]
    fn test_zone_bands() {
        let mut r = rng(3);
        for l in 1..=15 {
            let c = level_config(l, &mut r);
            assert_eq!(c.wind_zones + c.gravity_wells, 0, "level {l}");
        }
        for l in 16..=20 {
            let c = level_config(l, &mut r);
            assert_eq!((c.wind_zones, c.gravity_wells), (1, 0), "level {l}");
        }
        for l in 21..=25 {
            let c = level_config(l, &mut r);
            assert_eq!((c.wind_zones, c.gravity_wells), (0, 1), "level {l}");
        }
    }

    #[test]
    fn test_late_levels_roll_hazard_mix() {
        let mut r = rng(4);
        let mut saw_linked = false;
        let mut saw_single = false;
        for _ in 0..200 {
            let c = level_config(27, &mut r);
            let hazards = c.wind_zones + c.gravity_wells;
            assert!((1..=2).contains(&hazards));
            assert_eq!(c.dynamic_spikes, 2);
            if c.linked_pieces {
                saw_linked = true;
                assert_eq!(c.pieces, 2);
                assert_eq!(c.fake_silhouettes, 0);
            } else {
                saw_single = true;
                assert_eq!(c.pieces, 1);
                assert_eq!(c.fake_silhouettes, 1);
            }

            let c = level_config(35, &mut r);
            let hazards = c.wind_zones + c.gravity_wells;
            assert!((2..=3).contains(&hazards));
            assert_eq!(c.dynamic_spikes, 3);
        }
        assert!(saw_linked && saw_single);
    }

    #[test]
    fn test_generation_is_deterministic_per_seed() {
        let game = GameConfig::default();
        let mut r1 = rng(77);
        let mut r2 = rng(77);
        let c1 = level_config(28, &mut r1);
        let c2 = level_config(28, &mut r2);
        let l1 = generate_level(&c1, CANVAS, &game, &mut r1);
        let l2 = generate_level(&c2, CANVAS, &game, &mut r2);
        assert_eq!(l1.pieces.len(), l2.pieces.len());
        for (a, b) in l1.pieces.iter().zip(&l2.pieces) {
            assert_eq!(a.pos, b.pos);
        }
        for (a, b) in l1.obstacles.iter().zip(&l2.obstacles) {
            assert_eq!(a.pos, b.pos);
            assert_eq!(a.vel, b.vel);
        }
        assert_eq!(l1.zones, l2.zones);
    }

    #[test]
    fn test_single_piece_level_has_one_real_silhouette() {
        let game = GameConfig::default();
        let mut r = rng(5);
        let config = level_config(3, &mut r);
        let level = generate_level(&config, CANVAS, &game, &mut r);
        assert_eq!(level.pieces.len(), 1);
        assert_eq!(level.silhouettes.len(), 1);
        let piece = &level.pieces[0];
        let sil = level.silhouette_for(piece.id).unwrap();
        assert_eq!(sil.shape, piece.shape);
        assert!(!piece.touched);
    }

    #[test]
    fn test_ball_speed_bands() {
        let mut r = rng(6);
        for _ in 0..500 {
            let slow = ball_speed(12, &mut r);
            assert!((3.0..=6.0).contains(&slow));
            let fast = ball_speed(22, &mut r);
            assert!((1.5..=10.5).contains(&fast));
        }
    }

    #[test]
    fn test_trajectory_check_rejects_collision_course() {
        let piece = Piece {
            id: 1,
            pos: Vec2::new(200.0, 370.0),
            size: 60.0,
            shape: ShapeKind::Square,
            touched: false,
            linked: None,
        };
        let ball = Obstacle {
            id: 2,
            kind: ObstacleKind::DynamicBall,
            pos: Vec2::new(230.0, 100.0),
            size: BALL_SIZE,
            vel: Vec2::new(0.0, 5.0),
        };
        assert!(!trajectory_is_safe(&ball, std::slice::from_ref(&piece), CANVAS));

        let parallel = Obstacle {
            vel: Vec2::new(5.0, 0.0),
            ..ball
        };
        assert!(trajectory_is_safe(&parallel, std::slice::from_ref(&piece), CANVAS));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_generated_levels_respect_safety_distances(
            seed in any::<u64>(),
            level_index in 1u32..45,
            width in 400.0f32..900.0,
            height in 700.0f32..1400.0,
        ) {
            let game = GameConfig::default();
            let bounds = Vec2::new(width, height);
            let mut r = rng(seed);
            let config = level_config(level_index, &mut r);
            let level = generate_level(&config, bounds, &game, &mut r);

            let anchors: Vec<(Vec2, f32)> = level.anchor_centers().collect();

            for o in &level.obstacles {
                match o.kind {
                    ObstacleKind::StaticSpike => {
                        for &(c, half) in &anchors {
                            prop_assert!(c.distance(o.pos) >= SPIKE_CLEARANCE + half);
                        }
                    }
                    ObstacleKind::DynamicBall => {
                        // Re-run the opening two seconds independently
                        let mut probe = o.clone();
                        for _ in 0..TRAJECTORY_FRAMES {
                            probe.advance(bounds);
                            for p in &level.pieces {
                                prop_assert!(
                                    p.center().distance(probe.pos)
                                        >= probe.radius() + p.radius() + TRAJECTORY_BUFFER
                                );
                            }
                        }
                    }
                }
            }

            for z in &level.zones {
                match z.kind {
                    ZoneKind::Wind { start, end, direction, .. } => {
                        prop_assert!((direction.length() - 1.0).abs() < 1e-3);
                        for &(c, _) in &anchors {
                            prop_assert!(dist_point_to_segment(c, start, end) >= WIND_CLEARANCE);
                        }
                    }
                    ZoneKind::Well { center, .. } => {
                        for &(c, _) in &anchors {
                            prop_assert!(c.distance(center) >= WELL_CLEARANCE);
                        }
                    }
                }
            }

            // Linked partners share one offset between pieces and silhouettes
            for p in &level.pieces {
                if let Some(partner) = p.linked.and_then(|id| level.piece(id)) {
                    let sil = level.silhouette_for(p.id).unwrap();
                    let partner_sil = level.silhouette_for(partner.id).unwrap();
                    let d_pieces = partner.pos - p.pos;
                    let d_sils = partner_sil.pos - sil.pos;
                    prop_assert!((d_pieces - d_sils).length() < 1e-3);
                }
            }

            // No two real silhouettes accept the same piece
            let mut targets: Vec<u32> = level
                .silhouettes
                .iter()
                .filter_map(|s| match s.target {
                    SilhouetteTarget::Piece(id) => Some(id),
                    SilhouetteTarget::Fake => None,
                })
                .collect();
            let total = targets.len();
            targets.sort_unstable();
            targets.dedup();
            prop_assert_eq!(targets.len(), total);
            prop_assert_eq!(total, level.pieces.len());
        }
    }
}
