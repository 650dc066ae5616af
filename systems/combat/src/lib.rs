#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Hit-scan combat: picks the enemy under the crosshair and requests fire or reload.

use gridshot_core::{Command, ControlState, EnemyId, EnemyView, PlayerSnapshot, WeaponConfig};

/// Pure system that converts trigger input into weapon commands.
#[derive(Debug, Clone)]
pub struct Combat {
    range: f32,
    hit_tolerance: f32,
}

impl Combat {
    /// Creates a combat system from the configured weapon parameters.
    #[must_use]
    pub fn new(config: &WeaponConfig) -> Self {
        Self {
            range: config.range,
            hit_tolerance: config.hit_tolerance,
        }
    }

    /// Emits a fire command (with its hit-scan target) before a reload command.
    ///
    /// Readiness is decided by the world; a request made while empty or
    /// reloading is still emitted and comes back as a rejection event.
    pub fn handle(
        &self,
        controls: &ControlState,
        player: &PlayerSnapshot,
        enemies: &EnemyView,
        out: &mut Vec<Command>,
    ) {
        if controls.fire {
            out.push(Command::FireWeapon {
                target: self.select_target(player, enemies),
            });
        }
        if controls.reload {
            out.push(Command::Reload);
        }
    }

    /// Finds the alive enemy a shot fired now would strike.
    ///
    /// Each enemy is resolved into forward and lateral components along the
    /// player's facing. It qualifies when it lies ahead, within range, and its
    /// lateral offset is below its size scaled by the hit tolerance. Walls do
    /// not block the scan. The smallest forward distance wins and ties keep
    /// the first enemy in identifier order.
    #[must_use]
    pub fn select_target(&self, player: &PlayerSnapshot, enemies: &EnemyView) -> Option<EnemyId> {
        let forward = player.forward();
        let mut best: Option<(f32, EnemyId)> = None;

        for enemy in enemies.iter_alive() {
            let offset = enemy.position - player.position;
            let along = offset.dot(forward);
            if along <= 0.0 || along >= self.range {
                continue;
            }
            let lateral = forward.perp_dot(offset).abs();
            if lateral >= enemy.size * self.hit_tolerance {
                continue;
            }
            match best {
                Some((distance, _)) if distance <= along => {}
                _ => best = Some((along, enemy.id)),
            }
        }

        best.map(|(_, enemy)| enemy)
    }
}

impl Default for Combat {
    fn default() -> Self {
        Self::new(&WeaponConfig::default())
    }
}
