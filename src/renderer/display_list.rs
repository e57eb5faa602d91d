//! Frame display list
//!
//! Draw order: background, well vortex (additive), wind wisps (screen), zone
//! sources, static spikes, silhouettes, pieces with link guides, dynamic
//! balls, then ripples and sparks.

use glam::Vec2;
use std::f32::consts::FRAC_PI_4;

use super::shapes::{polygon, polyline, segment, shape_path};
use super::{Blend, DisplayItem, DrawCmd, Layer, Paint, Shadow, Stroke, colors, hsla};
use crate::background::{Background, BackgroundState};
use crate::game::Game;
use crate::sim::effects::Effects;
use crate::sim::geometry::Rect;
use crate::sim::{Level, ObstacleKind, SilhouetteTarget, ZoneKind};

/// Body radius of a static spike before breathing
const SPIKE_BODY_RADIUS: f32 = 15.0;
/// Radius of the black core drawn at a well center
const WELL_CORE_RADIUS: f32 = 30.0;
/// Breathing rate of static spikes (radians per second)
const BREATHE_RATE: f32 = 5.0;

/// Build everything visible this frame, in draw order
pub fn build_display_list(game: &Game) -> Vec<DisplayItem> {
    let mut out = Vec::new();

    if let Some(bg) = game.background() {
        push_background(&mut out, bg);
    }

    let Some(round) = game.round() else {
        return out;
    };
    let level = &round.level;

    // Touching the edge is fatal once a piece is in play
    out.push(DisplayItem::new(
        Layer::Background,
        DrawCmd::StrokeRect {
            rect: Rect::new(0.0, 0.0, level.bounds.x, level.bounds.y),
            paint: colors::WALL_WARNING.into(),
            stroke: Stroke::dashed(10.0, 20.0, 20.0),
        },
    ));

    push_well_particles(&mut out, &round.effects);
    push_wind_particles(&mut out, &round.effects);
    push_zone_sources(&mut out, level);
    push_static_hazards(&mut out, level, round.elapsed);
    push_silhouettes(&mut out, level);
    push_pieces(&mut out, level);
    push_dynamic_hazards(&mut out, level);
    push_effects(&mut out, &round.effects);

    out
}

fn push_background(out: &mut Vec<DisplayItem>, bg: &Background) {
    let full = Rect::new(0.0, 0.0, bg.size.x, bg.size.y);
    let item = |cmd| DisplayItem::new(Layer::Background, cmd);

    match &bg.state {
        BackgroundState::Loading { .. } => out.push(item(DrawCmd::FillRect {
            rect: full,
            paint: colors::SKY_TOP.into(),
        })),
        BackgroundState::Image { source, dest } => {
            out.push(item(DrawCmd::Image {
                source: source.clone(),
                dest: *dest,
            }));
            out.push(item(DrawCmd::FillRect {
                rect: full,
                paint: colors::IMAGE_TINT.into(),
            }));
        }
        BackgroundState::Procedural(scene) => {
            out.push(item(DrawCmd::FillRect {
                rect: full,
                paint: Paint::LinearGradient {
                    from: Vec2::ZERO,
                    to: Vec2::new(0.0, bg.size.y),
                    stops: scene.sky.clone(),
                },
            }));
            for cloud in &scene.clouds {
                for (center, radius) in cloud.puffs() {
                    out.push(item(DrawCmd::FillCircle {
                        center,
                        radius,
                        paint: colors::CLOUD.into(),
                    }));
                }
            }
            for hill in &scene.hills {
                out.push(item(DrawCmd::FillPath {
                    path: polygon(&hill.outline(bg.size)),
                    paint: hill.color.into(),
                }));
            }
        }
    }
}

fn push_well_particles(out: &mut Vec<DisplayItem>, fx: &Effects) {
    for well in &fx.wells {
        for mote in &well.motes {
            // Bright violet at the rim, dark and small near the core
            let ratio = (mote.radius / well.radius).clamp(0.0, 1.0);
            let color = [
                (50.0 * ratio).floor() / 255.0,
                (20.0 * ratio).floor() / 255.0,
                (100.0 + 155.0 * ratio).floor() / 255.0,
                0.5 + 0.5 * ratio,
            ];
            out.push(
                DisplayItem::new(
                    Layer::WellParticles,
                    DrawCmd::FillCircle {
                        center: well.mote_pos(mote),
                        radius: 2.0 + ratio * 2.0,
                        paint: color.into(),
                    },
                )
                .with_blend(Blend::Additive),
            );
        }
    }
}

fn push_wind_particles(out: &mut Vec<DisplayItem>, fx: &Effects) {
    for sys in &fx.wind {
        for streak in &sys.streaks {
            let [h, s, l] = streak.hsl;
            out.push(
                DisplayItem::new(
                    Layer::WindParticles,
                    DrawCmd::StrokePath {
                        path: polyline(&sys.wisp(streak, fx.global_time)),
                        paint: hsla(h, s, l, 0.8).into(),
                        stroke: Stroke {
                            width: streak.size,
                            dash: None,
                            round_cap: true,
                        },
                    },
                )
                .with_blend(Blend::Screen),
            );
        }
    }
}

fn push_zone_sources(out: &mut Vec<DisplayItem>, level: &Level) {
    for zone in &level.zones {
        match zone.kind {
            ZoneKind::Wind { start, end, .. } => {
                out.push(DisplayItem::new(
                    Layer::ZoneSources,
                    DrawCmd::StrokePath {
                        path: segment(start, end),
                        paint: colors::WIND_SOURCE_EDGE.into(),
                        stroke: Stroke::solid(14.0),
                    },
                ));
                out.push(DisplayItem::new(
                    Layer::ZoneSources,
                    DrawCmd::StrokePath {
                        path: segment(start, end),
                        paint: Paint::LinearGradient {
                            from: start,
                            to: end,
                            stops: vec![
                                (0.0, colors::WIND_SOURCE_LIGHT),
                                (0.5, colors::WIND_SOURCE_SHINE),
                                (1.0, colors::WIND_SOURCE_LIGHT),
                            ],
                        },
                        stroke: Stroke::solid(8.0),
                    },
                ));
            }
            ZoneKind::Well { center, .. } => out.push(DisplayItem::new(
                Layer::ZoneSources,
                DrawCmd::FillCircle {
                    center,
                    radius: WELL_CORE_RADIUS,
                    paint: colors::WELL_CORE.into(),
                },
            )),
        }
    }
}

/// Eight-pointed star that pulses over time
fn push_static_hazards(out: &mut Vec<DisplayItem>, level: &Level, time: f32) {
    let breathe = 1.0 + (time * BREATHE_RATE).sin() * 0.15;
    let glow = Shadow::glow(colors::SPIKE, 20.0 * breathe);

    for o in level
        .obstacles
        .iter()
        .filter(|o| o.kind == ObstacleKind::StaticSpike)
    {
        out.push(
            DisplayItem::new(
                Layer::StaticHazards,
                DrawCmd::FillCircle {
                    center: o.pos,
                    radius: SPIKE_BODY_RADIUS * breathe,
                    paint: colors::SPIKE.into(),
                },
            )
            .with_shadow(glow),
        );
        for i in 1..=8 {
            let rot = Vec2::from_angle(FRAC_PI_4 * i as f32);
            let tip = |v: Vec2| o.pos + rot.rotate(v * breathe);
            out.push(
                DisplayItem::new(
                    Layer::StaticHazards,
                    DrawCmd::FillPath {
                        path: polygon(&[
                            tip(Vec2::new(10.0, 0.0)),
                            tip(Vec2::new(25.0, 0.0)),
                            tip(Vec2::new(10.0, 6.0)),
                        ]),
                        paint: colors::SPIKE.into(),
                    },
                )
                .with_shadow(glow),
            );
        }
    }
}

fn push_silhouettes(out: &mut Vec<DisplayItem>, level: &Level) {
    for s in &level.silhouettes {
        out.push(DisplayItem::new(
            Layer::Silhouettes,
            DrawCmd::FillPath {
                path: shape_path(s.shape, s.rect()),
                paint: colors::SILHOUETTE.into(),
            },
        ));
    }
}

/// Pieces are cut from the background at their silhouette so they read as
/// the missing part of the picture
fn push_pieces(out: &mut Vec<DisplayItem>, level: &Level) {
    for p in &level.pieces {
        if let Some(partner) = p.linked.and_then(|id| level.piece(id)) {
            if p.id < partner.id {
                out.push(DisplayItem::new(
                    Layer::Pieces,
                    DrawCmd::StrokePath {
                        path: segment(p.center(), partner.center()),
                        paint: colors::LINK_GUIDE.into(),
                        stroke: Stroke::dashed(2.0, 5.0, 5.0),
                    },
                ));
            }
        }

        let Some(sil) = level
            .silhouettes
            .iter()
            .find(|s| s.target == SilhouetteTarget::Piece(p.id))
        else {
            continue;
        };

        let rect = p.rect();
        let path = shape_path(p.shape, rect);
        out.push(
            DisplayItem::new(
                Layer::Pieces,
                DrawCmd::BackgroundCutout {
                    clip: path.clone(),
                    src: sil.rect(),
                    dest: rect,
                },
            )
            .with_shadow(Shadow {
                color: colors::PIECE_SHADOW,
                blur: 12.0,
                offset: Vec2::new(0.0, 6.0),
            }),
        );
        out.push(DisplayItem::new(
            Layer::Pieces,
            DrawCmd::FillPath {
                path: path.clone(),
                paint: Paint::LinearGradient {
                    from: rect.min,
                    to: rect.max(),
                    stops: vec![
                        (0.0, colors::PIECE_SHEEN),
                        (0.5, colors::TRANSPARENT),
                        (1.0, colors::PIECE_SHADE),
                    ],
                },
            },
        ));
        out.push(DisplayItem::new(
            Layer::Pieces,
            DrawCmd::StrokePath {
                path: path.clone(),
                paint: colors::PIECE_RIM.into(),
                stroke: Stroke::solid(1.0),
            },
        ));
        out.push(DisplayItem::new(
            Layer::Pieces,
            DrawCmd::StrokePath {
                path,
                paint: colors::ACCENT.into(),
                stroke: Stroke::solid(3.0),
            },
        ));
    }
}

fn push_dynamic_hazards(out: &mut Vec<DisplayItem>, level: &Level) {
    for o in level
        .obstacles
        .iter()
        .filter(|o| o.kind == ObstacleKind::DynamicBall)
    {
        out.push(
            DisplayItem::new(
                Layer::DynamicHazards,
                DrawCmd::FillCircle {
                    center: o.pos,
                    radius: o.radius(),
                    paint: colors::BALL.into(),
                },
            )
            .with_shadow(Shadow::glow(colors::BALL_SHADOW, 5.0)),
        );
        out.push(DisplayItem::new(
            Layer::DynamicHazards,
            DrawCmd::FillCircle {
                center: o.pos - Vec2::splat(o.size / 6.0),
                radius: o.size / 8.0,
                paint: colors::BALL_SHINE.into(),
            },
        ));
    }
}

fn push_effects(out: &mut Vec<DisplayItem>, fx: &Effects) {
    for ripple in &fx.ripples {
        let alpha = ripple.alpha();
        out.push(
            DisplayItem::new(
                Layer::Effects,
                DrawCmd::StrokeCircle {
                    center: ripple.center,
                    radius: ripple.radius,
                    paint: colors::RIPPLE.into(),
                    stroke: Stroke::solid(4.0 + 4.0 * alpha),
                },
            )
            .with_alpha(alpha)
            .with_shadow(Shadow::glow(colors::RIPPLE, 20.0)),
        );
        if ripple.flashing() {
            out.push(
                DisplayItem::new(
                    Layer::Effects,
                    DrawCmd::FillCircle {
                        center: ripple.center,
                        radius: ripple.radius,
                        paint: colors::FLASH.into(),
                    },
                )
                .with_alpha(alpha * 0.8),
            );
        }
    }

    for spark in &fx.sparks {
        let color = if spark.gold {
            colors::SPARK_GOLD
        } else {
            colors::SPARK_WHITE
        };
        out.push(
            DisplayItem::new(
                Layer::Effects,
                DrawCmd::FillCircle {
                    center: spark.pos,
                    radius: spark.size,
                    paint: color.into(),
                },
            )
            .with_alpha(spark.alpha()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameMode;
    use crate::persistence::MemoryStorage;
    use crate::settings::Settings;
    use crate::sim::{LevelConfig, Obstacle, Piece, ShapeKind, Silhouette, Zone};

    const CANVAS: Vec2 = Vec2::new(450.0, 800.0);

    fn busy_level() -> Level {
        let config = LevelConfig {
            level: 40,
            time_limit: 3.0,
            pieces: 2,
            fake_silhouettes: 1,
            static_spikes: 1,
            dynamic_spikes: 1,
            wind_zones: 1,
            gravity_wells: 1,
            linked_pieces: true,
        };
        let mut lvl = Level::empty(config, CANVAS);
        let a = lvl.next_entity_id();
        let b = lvl.next_entity_id();
        for (id, partner, x) in [(a, b, 100.0), (b, a, 200.0)] {
            lvl.pieces.push(Piece {
                id,
                pos: Vec2::new(x, 100.0),
                size: 60.0,
                shape: ShapeKind::PuzzleClassic,
                touched: false,
                linked: Some(partner),
            });
            let sid = lvl.next_entity_id();
            lvl.silhouettes.push(Silhouette {
                id: sid,
                pos: Vec2::new(x, 600.0),
                size: 60.0,
                shape: ShapeKind::PuzzleClassic,
                target: SilhouetteTarget::Piece(id),
            });
        }
        let fake = lvl.next_entity_id();
        lvl.silhouettes.push(Silhouette {
            id: fake,
            pos: Vec2::new(300.0, 400.0),
            size: 60.0,
            shape: ShapeKind::Circle,
            target: SilhouetteTarget::Fake,
        });
        let spike = lvl.next_entity_id();
        lvl.obstacles.push(Obstacle {
            id: spike,
            kind: ObstacleKind::StaticSpike,
            pos: Vec2::new(350.0, 300.0),
            size: 50.0,
            vel: Vec2::ZERO,
        });
        let ball = lvl.next_entity_id();
        lvl.obstacles.push(Obstacle {
            id: ball,
            kind: ObstacleKind::DynamicBall,
            pos: Vec2::new(50.0, 450.0),
            size: 18.0,
            vel: Vec2::new(3.0, 0.0),
        });
        let wind = lvl.next_entity_id();
        lvl.zones.push(Zone {
            id: wind,
            kind: ZoneKind::Wind {
                start: Vec2::new(0.0, 300.0),
                end: Vec2::new(0.0, 500.0),
                direction: Vec2::X,
                max_dist: 270.0,
                strength: 4.0,
            },
        });
        let well = lvl.next_entity_id();
        lvl.zones.push(Zone {
            id: well,
            kind: ZoneKind::Well {
                center: Vec2::new(300.0, 700.0),
                radius: 250.0,
                strength: 1.8,
            },
        });
        lvl
    }

    fn game_with(level: Level) -> Game {
        let mut g = Game::new(
            Settings::default(),
            Box::new(MemoryStorage::new()),
            CANVAS,
            5,
        );
        g.start(GameMode::Crazy);
        g.play_level(level);
        g
    }

    #[test]
    fn test_layers_never_go_backwards() {
        let mut g = game_with(busy_level());
        g.update(0.05);
        let list = build_display_list(&g);
        assert!(!list.is_empty());
        for pair in list.windows(2) {
            assert!(
                pair[0].layer <= pair[1].layer,
                "{:?} drawn after {:?}",
                pair[1].layer,
                pair[0].layer
            );
        }
    }

    #[test]
    fn test_every_layer_present_for_busy_level() {
        let mut g = game_with(busy_level());
        g.update(0.05);
        let list = build_display_list(&g);
        for layer in [
            Layer::Background,
            Layer::WellParticles,
            Layer::WindParticles,
            Layer::ZoneSources,
            Layer::StaticHazards,
            Layer::Silhouettes,
            Layer::Pieces,
            Layer::DynamicHazards,
        ] {
            assert!(list.iter().any(|i| i.layer == layer), "missing {layer:?}");
        }
        // Effects only appear after a celebration
        assert!(list.iter().all(|i| i.layer != Layer::Effects));
    }

    #[test]
    fn test_particle_blend_modes() {
        let mut g = game_with(busy_level());
        g.update(0.05);
        let list = build_display_list(&g);
        assert!(
            list.iter()
                .filter(|i| i.layer == Layer::WellParticles)
                .all(|i| i.blend == Blend::Additive)
        );
        assert!(
            list.iter()
                .filter(|i| i.layer == Layer::WindParticles)
                .all(|i| i.blend == Blend::Screen)
        );
    }

    #[test]
    fn test_pieces_cut_from_their_silhouette() {
        let g = game_with(busy_level());
        let list = build_display_list(&g);
        let cutouts: Vec<_> = list
            .iter()
            .filter_map(|i| match &i.cmd {
                DrawCmd::BackgroundCutout { src, dest, .. } => Some((*src, *dest)),
                _ => None,
            })
            .collect();
        assert_eq!(cutouts.len(), 2);
        assert_eq!(cutouts[0].0.min, Vec2::new(100.0, 600.0));
        assert_eq!(cutouts[0].1.min, Vec2::new(100.0, 100.0));

        // One dashed guide per linked pair
        let guides = list
            .iter()
            .filter(|i| matches!(&i.cmd, DrawCmd::StrokePath { stroke, .. } if stroke.dash == Some([5.0, 5.0])))
            .count();
        assert_eq!(guides, 1);
    }

    #[test]
    fn test_silhouette_count() {
        let g = game_with(busy_level());
        let list = build_display_list(&g);
        assert_eq!(
            list.iter().filter(|i| i.layer == Layer::Silhouettes).count(),
            3
        );
    }

    #[test]
    fn test_no_round_only_background() {
        let g = Game::new(
            Settings::default(),
            Box::new(MemoryStorage::new()),
            CANVAS,
            1,
        );
        assert!(build_display_list(&g).is_empty());
    }
}
