#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-step ray marcher that finds the first solid surface along a ray.

use glam::Vec2;
use gridshot_core::{HitSurface, RayHit, RaycastConfig, TileLookup, TileMapView};

/// Marches a ray from `origin` along `angle` until it enters a solid cell.
///
/// Samples are taken every `config.step` world units, starting one step away
/// from the origin and ending at the first sample at or beyond
/// `config.max_distance`. Leaving the grid counts as striking the boundary.
/// Returns `None` when nothing solid lies within range.
#[must_use]
pub fn cast_ray(
    view: &TileMapView<'_>,
    origin: Vec2,
    angle: f32,
    config: &RaycastConfig,
) -> Option<RayHit> {
    let direction = Vec2::from_angle(angle);
    if !direction.is_finite() {
        return None;
    }

    let max_steps = max_steps(config);
    for step_index in 1..=max_steps {
        let distance = step_index as f32 * config.step;
        let point = origin + direction * distance;
        let surface = match view.tile_at(point) {
            TileLookup::Empty => continue,
            TileLookup::OutOfBounds => HitSurface::Boundary,
            TileLookup::Wall(kind) => HitSurface::Wall(kind),
        };
        return Some(RayHit {
            distance,
            point,
            surface,
        });
    }

    None
}

/// Number of samples a single ray takes at most.
#[must_use]
pub fn max_steps(config: &RaycastConfig) -> u32 {
    let usable = config.step.is_finite()
        && config.step > 0.0
        && config.max_distance.is_finite()
        && config.max_distance > 0.0;
    if !usable {
        return 0;
    }
    let steps = (config.max_distance / config.step).ceil();
    if steps >= u32::MAX as f32 {
        u32::MAX
    } else {
        steps as u32
    }
}
