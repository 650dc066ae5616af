//! Tunable simulation and projection parameters.
//!
//! Every section deserializes with defaults so partial TOML files only need to
//! name the values they override.

use std::{f32::consts::PI, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Complete set of tunables consumed by the world, systems and renderer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Player body and control parameters.
    pub player: PlayerConfig,
    /// Enemy stats and AI thresholds.
    pub enemies: EnemyConfig,
    /// Weapon behaviour.
    pub weapon: WeaponConfig,
    /// Ray marching parameters.
    pub raycast: RaycastConfig,
    /// Screen projection parameters.
    pub projection: ProjectionConfig,
    /// Frame driver parameters.
    pub simulation: SimulationConfig,
}

impl GameConfig {
    /// Checks that every parameter lies in a range the simulation can use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("player.speed", self.player.speed)?;
        non_negative("player.radius", self.player.radius)?;
        positive("player.max_health", self.player.max_health)?;
        if !(self.player.fov > 0.0 && self.player.fov < 2.0 * PI) {
            return Err(ConfigError::FieldOfView {
                fov: self.player.fov,
            });
        }
        positive("enemies.health", self.enemies.health)?;
        positive("enemies.size", self.enemies.size)?;
        non_negative("enemies.pursuit_radius", self.enemies.pursuit_radius)?;
        non_negative("enemies.speed", self.enemies.speed)?;
        non_negative("enemies.melee_range", self.enemies.melee_range)?;
        non_negative("enemies.melee_dps", self.enemies.melee_dps)?;
        if self.weapon.capacity == 0 {
            return Err(ConfigError::EmptyMagazine);
        }
        non_negative("weapon.damage", self.weapon.damage)?;
        positive("weapon.range", self.weapon.range)?;
        positive("weapon.hit_tolerance", self.weapon.hit_tolerance)?;
        non_negative("weapon.reload_seconds", self.weapon.reload_seconds)?;
        representable("weapon.reload_seconds", self.weapon.reload_seconds)?;
        positive("raycast.step", self.raycast.step)?;
        positive("raycast.max_distance", self.raycast.max_distance)?;
        if self.projection.max_columns == 0 {
            return Err(ConfigError::NoColumns);
        }
        positive("projection.wall_scale", self.projection.wall_scale)?;
        positive("projection.sprite_scale", self.projection.sprite_scale)?;
        positive(
            "projection.sprite_min_distance",
            self.projection.sprite_min_distance,
        )?;
        positive(
            "projection.sprite_max_distance",
            self.projection.sprite_max_distance,
        )?;
        non_negative("projection.sprite_fov_margin", self.projection.sprite_fov_margin)?;
        positive("projection.fog_distance", self.projection.fog_distance)?;
        non_negative("projection.min_shade", self.projection.min_shade)?;
        positive(
            "projection.floor_band_height",
            self.projection.floor_band_height,
        )?;
        positive(
            "simulation.max_frame_seconds",
            self.simulation.max_frame_seconds,
        )?;
        representable(
            "simulation.max_frame_seconds",
            self.simulation.max_frame_seconds,
        )?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn representable(field: &'static str, value: f32) -> Result<(), ConfigError> {
    Duration::try_from_secs_f32(value)
        .map(|_| ())
        .map_err(|_| ConfigError::DurationOutOfRange { field, value })
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

/// Player body and control parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Half extent of the square collision box.
    pub radius: f32,
    /// Horizontal field of view in radians.
    pub fov: f32,
    /// Starting and maximum health.
    pub max_health: f32,
    /// Radians turned per pixel of horizontal pointer motion.
    pub look_sensitivity: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 160.0,
            radius: 12.0,
            fov: PI / 3.0,
            max_health: 100.0,
            look_sensitivity: 0.002,
        }
    }
}

/// Enemy stats and AI thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    /// Health each enemy spawns with.
    pub health: f32,
    /// Collision and visual radius.
    pub size: f32,
    /// Distance within which an enemy chases the player.
    pub pursuit_radius: f32,
    /// Chase speed in world units per second.
    pub speed: f32,
    /// Distance within which an enemy damages the player.
    pub melee_range: f32,
    /// Melee damage per second.
    pub melee_dps: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            health: 30.0,
            size: 16.0,
            pursuit_radius: 200.0,
            speed: 40.0,
            melee_range: 28.0,
            melee_dps: 18.0,
        }
    }
}

/// Weapon behaviour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    /// Rounds held by a full magazine.
    pub capacity: u32,
    /// Health removed from the enemy that is hit.
    pub damage: f32,
    /// Maximum forward distance of the hit-scan.
    pub range: f32,
    /// Multiplier applied to enemy size to get the lateral hit window.
    pub hit_tolerance: f32,
    /// Seconds needed to refill the magazine.
    pub reload_seconds: f32,
}

impl WeaponConfig {
    /// Reload time as a duration, saturating at [`Duration::MAX`].
    #[must_use]
    pub fn reload_duration(&self) -> Duration {
        Duration::try_from_secs_f32(self.reload_seconds.max(0.0)).unwrap_or(Duration::MAX)
    }
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            capacity: 20,
            damage: 18.0,
            range: 800.0,
            hit_tolerance: 1.2,
            reload_seconds: 0.9,
        }
    }
}

/// Ray marching parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaycastConfig {
    /// Distance advanced per march step in world units.
    pub step: f32,
    /// Distance after which a ray gives up.
    pub max_distance: f32,
}

impl Default for RaycastConfig {
    fn default() -> Self {
        Self {
            step: 4.0,
            max_distance: 1000.0,
        }
    }
}

/// Screen projection parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Upper bound on the number of rays cast per frame.
    pub max_columns: u32,
    /// Wall projection constant; larger values make walls taller.
    pub wall_scale: f32,
    /// Billboard projection constant; larger values make enemies bigger.
    pub sprite_scale: f32,
    /// Distance floor applied when sizing billboards.
    pub sprite_min_distance: f32,
    /// Enemies farther than this are not drawn.
    pub sprite_max_distance: f32,
    /// Extra angle beyond half the field of view within which enemies are drawn.
    pub sprite_fov_margin: f32,
    /// Distance at which walls reach the darkest shade.
    pub fog_distance: f32,
    /// Brightness floor for distant walls.
    pub min_shade: f32,
    /// Height of each floor band in pixels.
    pub floor_band_height: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            max_columns: 400,
            wall_scale: 320.0,
            sprite_scale: 240.0,
            sprite_min_distance: 10.0,
            sprite_max_distance: 900.0,
            sprite_fov_margin: 0.2,
            fog_distance: 900.0,
            min_shade: 0.25,
            floor_band_height: 4.0,
        }
    }
}

/// Frame driver parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Longest frame delta fed to the simulation, in seconds.
    pub max_frame_seconds: f32,
}

impl SimulationConfig {
    /// Longest frame delta as a duration, saturating at [`Duration::MAX`].
    #[must_use]
    pub fn max_frame_delta(&self) -> Duration {
        Duration::try_from_secs_f32(self.max_frame_seconds.max(0.0)).unwrap_or(Duration::MAX)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_frame_seconds: 0.05,
        }
    }
}

/// Errors reported when validating a [`GameConfig`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A parameter that must be strictly positive was not.
    #[error("{field} must be positive (received {value})")]
    NotPositive {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Value that failed validation.
        value: f32,
    },
    /// A parameter that must not be negative was.
    #[error("{field} must not be negative (received {value})")]
    Negative {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Value that failed validation.
        value: f32,
    },
    /// A duration in seconds is too large to represent.
    #[error("{field} is too large to represent as a duration (received {value})")]
    DurationOutOfRange {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Value that failed validation.
        value: f32,
    },
    /// The field of view is outside `(0, 2π)`.
    #[error("player.fov must lie strictly between 0 and 2π (received {fov})")]
    FieldOfView {
        /// Value that failed validation.
        fov: f32,
    },
    /// The magazine cannot hold any rounds.
    #[error("weapon.capacity must be at least 1")]
    EmptyMagazine,
    /// No screen columns would be rendered.
    #[error("projection.max_columns must be at least 1")]
    NoColumns,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config: GameConfig = toml::from_str(
            r#"
                [player]
                speed = 200.0

                [weapon]
                capacity = 8
            "#,
        )
        .expect("partial config should parse");

        assert_eq!(config.player.speed, 200.0);
        assert_eq!(config.player.radius, PlayerConfig::default().radius);
        assert_eq!(config.weapon.capacity, 8);
        assert_eq!(config.raycast, RaycastConfig::default());
    }

    #[test]
    fn validation_rejects_degenerate_values() {
        let mut config = GameConfig::default();
        config.raycast.step = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "raycast.step",
                ..
            })
        ));

        let mut config = GameConfig::default();
        config.player.fov = 7.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FieldOfView { .. })
        ));

        let mut config = GameConfig::default();
        config.weapon.capacity = 0;
        assert_eq!(config.validate(), Err(ConfigError::EmptyMagazine));
    }

    #[test]
    fn durations_follow_configured_seconds() {
        let config = GameConfig::default();
        let reload = config.weapon.reload_duration().as_secs_f64();
        let frame = config.simulation.max_frame_delta().as_secs_f64();
        assert!((reload - 0.9).abs() < 1e-6, "reload lasted {reload}s");
        assert!((frame - 0.05).abs() < 1e-6, "frame cap was {frame}s");
    }

    #[test]
    fn oversized_durations_are_rejected_and_saturate() {
        let mut config = GameConfig::default();
        config.weapon.reload_seconds = 1e20;
        assert_eq!(
            config.validate(),
            Err(ConfigError::DurationOutOfRange {
                field: "weapon.reload_seconds",
                value: 1e20
            })
        );
        assert_eq!(config.weapon.reload_duration(), Duration::MAX);

        let mut config = GameConfig::default();
        config.simulation.max_frame_seconds = 1e20;
        assert_eq!(
            config.validate(),
            Err(ConfigError::DurationOutOfRange {
                field: "simulation.max_frame_seconds",
                value: 1e20
            })
        );
        assert_eq!(config.simulation.max_frame_delta(), Duration::MAX);
    }
}
