//! Converts ray hits and enemy positions into screen-space geometry.

use gridshot_core::{normalize_angle, EnemyView, ProjectionConfig, RayHit};

use crate::{Billboard, Camera, Viewport, WallSlice};

/// Number of rays cast for a surface of the provided width.
///
/// Rendering resolution is decoupled from the display: at most `max_columns`
/// rays are cast and their strips are stretched across the surface.
#[must_use]
pub fn column_count(viewport: Viewport, max_columns: u32) -> u32 {
    if !viewport.is_drawable() {
        return 0;
    }
    let width = viewport.width.floor();
    if width >= max_columns as f32 {
        max_columns
    } else {
        width as u32
    }
}

/// Casts one ray per column and projects every hit into a wall slice.
///
/// `cast` receives the absolute ray angle and returns the first solid hit.
/// Columns whose ray leaves the configured range produce no slice.
pub fn project_walls<F>(
    camera: &Camera,
    viewport: Viewport,
    cell_size: f32,
    config: &ProjectionConfig,
    mut cast: F,
    out: &mut Vec<WallSlice>,
) where
    F: FnMut(f32) -> Option<RayHit>,
{
    out.clear();

    let columns = column_count(viewport, config.max_columns);
    if columns == 0 || cell_size <= 0.0 {
        return;
    }

    let column_width = viewport.width / columns as f32;
    let angle_step = camera.fov / columns as f32;
    let horizon = viewport.horizon();
    let first_angle = camera.facing - camera.fov / 2.0;

    for column in 0..columns {
        let ray_angle = first_angle + angle_step * column as f32;
        let Some(hit) = cast(ray_angle) else {
            continue;
        };

        let distance = hit.distance * (ray_angle - camera.facing).cos();
        let wall_height = cell_size * config.wall_scale / distance.max(1.0);
        let shade = (1.0 - distance / config.fog_distance)
            .max(config.min_shade)
            .min(1.0);

        out.push(WallSlice {
            column,
            x: (column as f32 * column_width).floor(),
            width: column_width.ceil() + 1.0,
            top: (horizon - wall_height / 2.0).floor(),
            bottom: (horizon + wall_height / 2.0).floor(),
            distance,
            shade,
            wall: hit.surface.wall_kind(),
            texture_u: hit.point.x.rem_euclid(cell_size) / cell_size,
        });
    }
}

/// Projects every alive enemy that is inside the widened view cone and in range.
///
/// Billboards are not tested against walls and keep enemy order.
pub fn project_billboards(
    camera: &Camera,
    viewport: Viewport,
    cell_size: f32,
    config: &ProjectionConfig,
    enemies: &EnemyView,
    out: &mut Vec<Billboard>,
) {
    out.clear();
    if !viewport.is_drawable() || camera.fov <= 0.0 {
        return;
    }

    let half_fov = camera.fov / 2.0;
    for enemy in enemies.iter_alive() {
        let offset = enemy.position - camera.position;
        let distance = offset.length();
        let angle = normalize_angle(offset.y.atan2(offset.x) - camera.facing);

        if angle.abs() >= half_fov + config.sprite_fov_margin
            || distance >= config.sprite_max_distance
        {
            continue;
        }

        out.push(Billboard {
            enemy: enemy.id,
            screen_x: (0.5 + angle / camera.fov) * viewport.width,
            size: cell_size * config.sprite_scale / distance.max(config.sprite_min_distance),
            distance,
        });
    }
}
