//! Composes a projected [`Scene`] into an ordered list of draw operations.
//!
//! Draw order: sky, floor base, wall strips each followed by their fog
//! overlay and floor bands, enemy billboards, crosshair, HUD. Every textured
//! step falls back to a flat fill while its texture is pending or failed.

use std::f32::consts::TAU;

use glam::Vec2;
use gridshot_core::PlayerStatus;

use crate::{
    Billboard, Color, DrawOp, Rect, Scene, TextureCatalog, TextureRole, TextureSize, Viewport,
    WallSlice,
};

const SKY_FALLBACK: Color = Color::from_rgb_u8(0x66, 0x66, 0xaa);
const FLOOR_BASE: Color = Color::from_rgb_u8(0x33, 0x33, 0x33);
const FLOOR_BAND: Color = Color::from_rgb_u8(0x22, 0x22, 0x22);
const WALL_FALLBACK: Color = Color::from_rgb_u8(200, 100, 100);
const FOG: Color = Color::new(0.0, 0.0, 0.0, 1.0);
const ENEMY_HEAD: Color = Color::new(180.0 / 255.0, 50.0 / 255.0, 50.0 / 255.0, 0.95);
const ENEMY_BODY: Color = Color::new(200.0 / 255.0, 80.0 / 255.0, 80.0 / 255.0, 0.95);
const CROSSHAIR: Color = Color::new(1.0, 1.0, 1.0, 0.7);
const CROSSHAIR_ARM: f32 = 10.0;
const CROSSHAIR_THICKNESS: f32 = 2.0;
const ENEMY_HEAD_MIN_RADIUS: f32 = 6.0;

const HUD_MARGIN: f32 = 16.0;
const HUD_BAR_WIDTH: f32 = 200.0;
const HUD_BAR_HEIGHT: f32 = 14.0;
const HUD_TEXT_SIZE: f32 = 24.0;
const HUD_PANEL: Color = Color::new(0.0, 0.0, 0.0, 0.5);
const HUD_HEALTH: Color = Color::from_rgb_u8(0xcc, 0x33, 0x33);
const HUD_TEXT: Color = Color::new(1.0, 1.0, 1.0, 0.9);

/// Appends the draw operations for one frame to `out`.
///
/// `out` is cleared first. Nothing is emitted for a surface without area.
pub fn compose_frame<T>(scene: &Scene, textures: &T, out: &mut Vec<DrawOp>)
where
    T: TextureCatalog + ?Sized,
{
    out.clear();
    let viewport = scene.viewport;
    if !viewport.is_drawable() {
        return;
    }

    draw_sky(scene, textures, out);
    out.push(DrawOp::FillRect {
        rect: Rect::new(0.0, viewport.horizon(), viewport.width, viewport.horizon()),
        color: FLOOR_BASE,
    });

    let floor_loaded = textures.state(TextureRole::Floor).loaded().is_some();
    for slice in &scene.walls {
        draw_wall(slice, viewport, textures, out);
        if floor_loaded {
            draw_floor_bands(slice, viewport, scene.floor_band_height, out);
        }
    }

    for billboard in &scene.billboards {
        draw_billboard(billboard, viewport, out);
    }

    draw_crosshair(viewport, out);

    if let Some(status) = &scene.hud {
        draw_hud(status, viewport, out);
    }
}

fn draw_sky<T>(scene: &Scene, textures: &T, out: &mut Vec<DrawOp>)
where
    T: TextureCatalog + ?Sized,
{
    let viewport = scene.viewport;
    let Some(TextureSize { width, height }) = textures.state(TextureRole::Sky).loaded() else {
        out.push(DrawOp::FillRect {
            rect: Rect::new(0.0, 0.0, viewport.width, viewport.horizon()),
            color: SKY_FALLBACK,
        });
        return;
    };

    let sky_width = width as f32;
    let sky_height = height as f32;
    let turn = scene.camera.facing.rem_euclid(TAU) / TAU;
    let offset = (turn * sky_width).floor().clamp(0.0, sky_width - 1.0);
    let leading = sky_width - offset;
    let split = viewport.width * leading / sky_width;

    out.push(DrawOp::Blit {
        role: TextureRole::Sky,
        source: Rect::new(offset, 0.0, leading, sky_height),
        dest: Rect::new(0.0, 0.0, split, viewport.horizon()),
    });
    if offset > 0.0 {
        out.push(DrawOp::Blit {
            role: TextureRole::Sky,
            source: Rect::new(0.0, 0.0, offset, sky_height),
            dest: Rect::new(split, 0.0, viewport.width * offset / sky_width, viewport.horizon()),
        });
    }
}

fn draw_wall<T>(slice: &WallSlice, viewport: Viewport, textures: &T, out: &mut Vec<DrawOp>)
where
    T: TextureCatalog + ?Sized,
{
    let full_height = slice.bottom - slice.top;
    let visible_top = slice.top.max(0.0);
    let visible_bottom = slice.bottom.min(viewport.height);
    let visible_height = visible_bottom - visible_top;
    if full_height <= 0.0 || visible_height <= 0.0 {
        return;
    }
    let dest = Rect::new(slice.x, visible_top, slice.width, visible_height);

    let role = TextureRole::for_wall(slice.wall);
    let Some(size) = textures.state(role).loaded() else {
        out.push(DrawOp::FillRect {
            rect: dest,
            color: WALL_FALLBACK.with_alpha(slice.shade),
        });
        return;
    };

    let texture_width = size.width as f32;
    let texture_height = size.height as f32;
    let texel = (slice.texture_u * texture_width)
        .floor()
        .clamp(0.0, texture_width - 1.0);
    let source_top = (visible_top - slice.top) / full_height * texture_height;
    let source_height = visible_height / full_height * texture_height;

    out.push(DrawOp::Blit {
        role,
        source: Rect::new(texel, source_top, 1.0, source_height),
        dest,
    });
    out.push(DrawOp::FillRect {
        rect: dest,
        color: FOG.with_alpha(1.0 - slice.shade),
    });
}

fn draw_floor_bands(slice: &WallSlice, viewport: Viewport, band: f32, out: &mut Vec<DrawOp>) {
    if !(band.is_finite() && band > 0.0) {
        return;
    }
    let mut y = slice.bottom.max(viewport.horizon());
    while y < viewport.height {
        out.push(DrawOp::FillRect {
            rect: Rect::new(slice.x, y, slice.width, band),
            color: FLOOR_BAND,
        });
        y += band;
    }
}

fn draw_billboard(billboard: &Billboard, viewport: Viewport, out: &mut Vec<DrawOp>) {
    let size = billboard.size;
    let top = viewport.horizon() - size / 2.0;

    out.push(DrawOp::FillCircle {
        center: Vec2::new(billboard.screen_x, top + size * 0.45),
        radius: (size * 0.25).max(ENEMY_HEAD_MIN_RADIUS),
        color: ENEMY_HEAD,
    });
    out.push(DrawOp::FillRect {
        rect: Rect::new(
            billboard.screen_x - size * 0.25,
            top + size * 0.2,
            size * 0.5,
            size * 0.6,
        ),
        color: ENEMY_BODY,
    });
}

fn draw_crosshair(viewport: Viewport, out: &mut Vec<DrawOp>) {
    let center = Vec2::new(viewport.width / 2.0, viewport.horizon());
    out.push(DrawOp::Line {
        from: center - Vec2::new(CROSSHAIR_ARM, 0.0),
        to: center + Vec2::new(CROSSHAIR_ARM, 0.0),
        thickness: CROSSHAIR_THICKNESS,
        color: CROSSHAIR,
    });
    out.push(DrawOp::Line {
        from: center - Vec2::new(0.0, CROSSHAIR_ARM),
        to: center + Vec2::new(0.0, CROSSHAIR_ARM),
        thickness: CROSSHAIR_THICKNESS,
        color: CROSSHAIR,
    });
}

fn draw_hud(status: &PlayerStatus, viewport: Viewport, out: &mut Vec<DrawOp>) {
    let bar_y = viewport.height - HUD_MARGIN - HUD_BAR_HEIGHT;
    let fraction = status.health.clamp(0.0, 100.0) / 100.0;

    out.push(DrawOp::FillRect {
        rect: Rect::new(HUD_MARGIN, bar_y, HUD_BAR_WIDTH, HUD_BAR_HEIGHT),
        color: HUD_PANEL,
    });
    if fraction > 0.0 {
        out.push(DrawOp::FillRect {
            rect: Rect::new(HUD_MARGIN, bar_y, HUD_BAR_WIDTH * fraction, HUD_BAR_HEIGHT),
            color: HUD_HEALTH,
        });
    }

    let ammo = if status.reloading {
        String::from("Ammo: reloading")
    } else {
        format!("Ammo: {}/{}", status.ammo, status.capacity)
    };
    out.push(DrawOp::Text {
        text: ammo,
        position: Vec2::new(HUD_MARGIN, bar_y - 8.0),
        size: HUD_TEXT_SIZE,
        color: HUD_TEXT,
    });
    out.push(DrawOp::Text {
        text: format!("Kills: {}", status.kills),
        position: Vec2::new(HUD_MARGIN, bar_y - 8.0 - HUD_TEXT_SIZE),
        size: HUD_TEXT_SIZE,
        color: HUD_TEXT,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Camera, TextureState, TextureStates};
    use gridshot_core::{EnemyId, WallKind};

    fn slice(top: f32, bottom: f32, shade: f32) -> WallSlice {
        WallSlice {
            column: 0,
            x: 10.0,
            width: 3.0,
            top,
            bottom,
            distance: 100.0,
            shade,
            wall: WallKind::Wood,
            texture_u: 0.5,
        }
    }

    fn scene_with(walls: Vec<WallSlice>) -> Scene {
        Scene {
            walls,
            ..Scene::new(Viewport::new(400.0, 200.0), 4.0)
        }
    }

    fn loaded(width: u32, height: u32) -> TextureState {
        TextureState::Loaded(TextureSize::new(width, height))
    }

    fn all_loaded() -> TextureStates {
        let mut states = TextureStates::pending();
        states.set(TextureRole::Brick, loaded(64, 64));
        states.set(TextureRole::Wood, loaded(64, 64));
        states.set(TextureRole::Sky, loaded(512, 256));
        states.set(TextureRole::Floor, loaded(128, 128));
        states
    }

    #[test]
    fn missing_textures_fall_back_to_flat_fills() {
        let scene = scene_with(vec![slice(50.0, 150.0, 0.6)]);
        let mut ops = Vec::new();

        compose_frame(&scene, &TextureStates::failed(), &mut ops);

        assert!(ops.iter().all(|op| !matches!(op, DrawOp::Blit { .. })));
        assert_eq!(
            ops[0],
            DrawOp::FillRect {
                rect: Rect::new(0.0, 0.0, 400.0, 100.0),
                color: SKY_FALLBACK,
            }
        );
        assert_eq!(
            ops[1],
            DrawOp::FillRect {
                rect: Rect::new(0.0, 100.0, 400.0, 100.0),
                color: FLOOR_BASE,
            }
        );
        assert_eq!(
            ops[2],
            DrawOp::FillRect {
                rect: Rect::new(10.0, 50.0, 3.0, 100.0),
                color: WALL_FALLBACK.with_alpha(0.6),
            }
        );
        assert!(matches!(ops[3], DrawOp::Line { .. }), "no floor bands without floor texture");
    }

    #[test]
    fn textured_wall_is_followed_by_fog_overlay_and_bands() {
        let scene = scene_with(vec![slice(60.0, 140.0, 0.75)]);
        let mut ops = Vec::new();

        compose_frame(&scene, &all_loaded(), &mut ops);

        let wall_ops: Vec<_> = ops
            .iter()
            .skip_while(|op| !matches!(op, DrawOp::Blit { role: TextureRole::Wood, .. }))
            .take(2)
            .cloned()
            .collect();
        assert_eq!(
            wall_ops,
            vec![
                DrawOp::Blit {
                    role: TextureRole::Wood,
                    source: Rect::new(32.0, 0.0, 1.0, 64.0),
                    dest: Rect::new(10.0, 60.0, 3.0, 80.0),
                },
                DrawOp::FillRect {
                    rect: Rect::new(10.0, 60.0, 3.0, 80.0),
                    color: Color::new(0.0, 0.0, 0.0, 0.25),
                },
            ]
        );

        let bands = ops
            .iter()
            .filter(|op| matches!(op, DrawOp::FillRect { color, .. } if *color == FLOOR_BAND))
            .count();
        assert_eq!(bands, 15, "from y=140 to y=200 in 4px bands");
    }

    #[test]
    fn fog_overlay_alpha_stays_within_unit_range() {
        let scene = scene_with(vec![slice(60.0, 140.0, 1.4), slice(60.0, 140.0, -0.5)]);
        let mut ops = Vec::new();

        compose_frame(&scene, &all_loaded(), &mut ops);

        let fog: Vec<f32> = ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillRect { color, .. }
                    if color.red == 0.0 && color.green == 0.0 && color.blue == 0.0 =>
                {
                    Some(color.alpha)
                }
                _ => None,
            })
            .collect();
        assert_eq!(fog, vec![0.0, 1.0]);
    }

    #[test]
    fn clamped_slices_crop_the_texture_source() {
        let scene = scene_with(vec![slice(-100.0, 300.0, 1.0)]);
        let mut ops = Vec::new();

        compose_frame(&scene, &all_loaded(), &mut ops);

        let blit = ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Blit {
                    role: TextureRole::Wood,
                    source,
                    dest,
                } => Some((*source, *dest)),
                _ => None,
            })
            .expect("wall blit");
        assert_eq!(blit.1, Rect::new(10.0, 0.0, 3.0, 200.0));
        assert_eq!(blit.0, Rect::new(32.0, 16.0, 1.0, 32.0));
    }

    #[test]
    fn sky_pans_with_facing_and_wraps() {
        let mut scene = scene_with(Vec::new());
        scene.camera = Camera {
            facing: std::f32::consts::PI,
            ..Camera::default()
        };
        let mut ops = Vec::new();

        compose_frame(&scene, &all_loaded(), &mut ops);

        assert_eq!(
            &ops[..2],
            &[
                DrawOp::Blit {
                    role: TextureRole::Sky,
                    source: Rect::new(256.0, 0.0, 256.0, 256.0),
                    dest: Rect::new(0.0, 0.0, 200.0, 100.0),
                },
                DrawOp::Blit {
                    role: TextureRole::Sky,
                    source: Rect::new(0.0, 0.0, 256.0, 256.0),
                    dest: Rect::new(200.0, 0.0, 200.0, 100.0),
                },
            ]
        );

        scene.camera.facing = 0.0;
        compose_frame(&scene, &all_loaded(), &mut ops);
        let sky_blits = ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Blit { role: TextureRole::Sky, .. }))
            .count();
        assert_eq!(sky_blits, 1, "facing zero needs no wrap-around blit");
    }

    #[test]
    fn billboards_and_crosshair_follow_walls() {
        let mut scene = scene_with(vec![slice(60.0, 140.0, 1.0)]);
        scene.billboards = vec![Billboard {
            enemy: EnemyId::new(0),
            screen_x: 120.0,
            size: 40.0,
            distance: 384.0,
        }];
        let mut ops = Vec::new();

        compose_frame(&scene, &TextureStates::failed(), &mut ops);

        let tail = &ops[ops.len() - 4..];
        assert_eq!(
            tail[0],
            DrawOp::FillCircle {
                center: Vec2::new(120.0, 98.0),
                radius: 10.0,
                color: ENEMY_HEAD,
            }
        );
        assert_eq!(
            tail[1],
            DrawOp::FillRect {
                rect: Rect::new(110.0, 88.0, 20.0, 24.0),
                color: ENEMY_BODY,
            }
        );
        assert_eq!(
            tail[2],
            DrawOp::Line {
                from: Vec2::new(190.0, 100.0),
                to: Vec2::new(210.0, 100.0),
                thickness: 2.0,
                color: CROSSHAIR,
            }
        );
        assert!(matches!(tail[3], DrawOp::Line { .. }));
    }

    #[test]
    fn small_billboards_keep_a_minimum_head_radius() {
        let mut ops = Vec::new();
        draw_billboard(
            &Billboard {
                enemy: EnemyId::new(1),
                screen_x: 0.0,
                size: 8.0,
                distance: 800.0,
            },
            Viewport::new(100.0, 100.0),
            &mut ops,
        );

        assert!(matches!(ops[0], DrawOp::FillCircle { radius, .. } if radius == 6.0));
    }

    #[test]
    fn hud_reports_health_ammo_and_kills() {
        let mut scene = scene_with(Vec::new());
        scene.hud = Some(PlayerStatus {
            health: 50.0,
            ammo: 7,
            capacity: 20,
            kills: 3,
            reloading: false,
        });
        let mut ops = Vec::new();

        compose_frame(&scene, &TextureStates::failed(), &mut ops);

        let texts: Vec<&str> = ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["Ammo: 7/20", "Kills: 3"]);
        assert!(ops.iter().any(|op| matches!(
            op,
            DrawOp::FillRect { rect, color } if *color == HUD_HEALTH && rect.width == 100.0
        )));

        scene.hud = Some(PlayerStatus {
            health: 0.0,
            reloading: true,
            ..scene.hud.expect("hud present")
        });
        compose_frame(&scene, &TextureStates::failed(), &mut ops);
        assert!(ops
            .iter()
            .any(|op| matches!(op, DrawOp::Text { text, .. } if text == "Ammo: reloading")));
        assert!(!ops
            .iter()
            .any(|op| matches!(op, DrawOp::FillRect { color, .. } if *color == HUD_HEALTH)));
    }

    #[test]
    fn degenerate_viewport_draws_nothing() {
        let scene = Scene::new(Viewport::new(0.0, 0.0), 4.0);
        let mut ops = vec![DrawOp::FillRect {
            rect: Rect::new(0.0, 0.0, 1.0, 1.0),
            color: CROSSHAIR,
        }];

        compose_frame(&scene, &all_loaded(), &mut ops);

        assert!(ops.is_empty());
    }
}
