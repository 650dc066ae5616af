#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Enemy pursuit AI: chase the player when close and bite when closer.

use std::time::Duration;

use gridshot_core::{Command, EnemyConfig, EnemyView, PlayerSnapshot};

/// Distance below which an enemy is considered on top of the player and stops steering.
const STEERING_EPSILON: f32 = 1e-4;

/// Pure system that emits enemy movement and melee damage commands.
#[derive(Debug, Clone)]
pub struct Pursuit {
    pursuit_radius: f32,
    speed: f32,
    melee_range: f32,
    melee_dps: f32,
}

impl Pursuit {
    /// Creates a pursuit system from the configured enemy parameters.
    #[must_use]
    pub fn new(config: &EnemyConfig) -> Self {
        Self {
            pursuit_radius: config.pursuit_radius,
            speed: config.speed,
            melee_range: config.melee_range,
            melee_dps: config.melee_dps,
        }
    }

    /// Emits one move and at most one damage command per alive enemy in range.
    ///
    /// Distances are measured before any enemy moves, so an enemy that steps
    /// into melee range this frame starts biting on the next one.
    pub fn handle(
        &self,
        player: &PlayerSnapshot,
        enemies: &EnemyView,
        dt: Duration,
        out: &mut Vec<Command>,
    ) {
        let seconds = dt.as_secs_f32();
        if seconds <= 0.0 {
            return;
        }

        for enemy in enemies.iter_alive() {
            let offset = player.position - enemy.position;
            let distance = offset.length();
            if distance.is_nan() || distance >= self.pursuit_radius {
                continue;
            }

            if distance > STEERING_EPSILON {
                let displacement = offset / distance * self.speed * seconds;
                out.push(Command::MoveEnemy {
                    enemy: enemy.id,
                    displacement,
                });
            }

            if distance < self.melee_range {
                out.push(Command::DamagePlayer {
                    amount: self.melee_dps * seconds,
                });
            }
        }
    }
}

impl Default for Pursuit {
    fn default() -> Self {
        Self::new(&EnemyConfig::default())
    }
}
