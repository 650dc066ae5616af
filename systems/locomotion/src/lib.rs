#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns polled player controls into turn and move commands.

use std::{f32::consts::FRAC_PI_2, time::Duration};

use glam::Vec2;
use gridshot_core::{Command, ControlState, PlayerConfig, PlayerSnapshot};

/// Translates directional input and pointer motion into player commands.
#[derive(Debug, Clone)]
pub struct Locomotion {
    look_sensitivity: f32,
}

impl Locomotion {
    /// Creates a locomotion system using the configured look sensitivity.
    #[must_use]
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            look_sensitivity: config.look_sensitivity,
        }
    }

    /// Emits a turn command for the horizontal pointer motion, if any.
    pub fn look(&self, controls: &ControlState, out: &mut Vec<Command>) {
        let radians = controls.look_delta * self.look_sensitivity;
        if radians != 0.0 && radians.is_finite() {
            out.push(Command::TurnPlayer { radians });
        }
    }

    /// Emits a move command scaled by the player's speed and the frame delta.
    ///
    /// Opposing inputs cancel; diagonal input is normalised so strafing while
    /// walking is no faster than walking.
    pub fn handle(
        &self,
        controls: &ControlState,
        player: &PlayerSnapshot,
        dt: Duration,
        out: &mut Vec<Command>,
    ) {
        let direction = intent(controls, player.facing).normalize_or_zero();
        if direction == Vec2::ZERO {
            return;
        }

        let displacement = direction * player.speed * dt.as_secs_f32();
        if displacement != Vec2::ZERO && displacement.is_finite() {
            out.push(Command::MovePlayer { displacement });
        }
    }
}

impl Default for Locomotion {
    fn default() -> Self {
        Self::new(&PlayerConfig::default())
    }
}

fn intent(controls: &ControlState, facing: f32) -> Vec2 {
    let mut intent = Vec2::ZERO;
    if controls.forward {
        intent += Vec2::from_angle(facing);
    }
    if controls.backward {
        intent -= Vec2::from_angle(facing);
    }
    if controls.strafe_left {
        intent += Vec2::from_angle(facing - FRAC_PI_2);
    }
    if controls.strafe_right {
        intent += Vec2::from_angle(facing + FRAC_PI_2);
    }
    intent
}
