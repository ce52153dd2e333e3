//! Avatar movement
//!
//! In the browser a physics engine owns the avatar body; this module turns held
//! inputs into the velocity it should be given. `Avatar` is a minimal kinematic
//! stand-in for hosts without physics (the headless driver, tests).

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::tuning::MovementTuning;

/// Held movement inputs for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Held {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

/// World-relative planar velocity (x, z) for the held inputs.
/// Forward is -z, right is +x. Diagonals are normalized.
pub fn planar_velocity(held: &Held, speed: f32) -> Vec2 {
    let mut dir = Vec2::ZERO;
    if held.forward {
        dir.y -= 1.0;
    }
    if held.back {
        dir.y += 1.0;
    }
    if held.left {
        dir.x -= 1.0;
    }
    if held.right {
        dir.x += 1.0;
    }
    dir.normalize_or_zero() * speed
}

/// Velocity to hand to the avatar body this frame, given its current velocity
pub fn desired_velocity(held: &Held, current: Vec3, tuning: &MovementTuning) -> Vec3 {
    let planar = planar_velocity(held, tuning.speed);
    // Jump only when (nearly) at rest vertically
    let vy = if held.jump && current.y.abs() < tuning.grounded_vy {
        tuning.jump_velocity
    } else {
        current.y
    };
    Vec3::new(planar.x, vy, planar.y)
}

/// Kinematic avatar on a flat ground plane at y = 0
#[derive(Debug, Clone, Default, Serialize)]
pub struct Avatar {
    pub pos: Vec3,
    pub vel: Vec3,
}

impl Avatar {
    pub fn new(pos: Vec3) -> Self {
        Self { pos, vel: Vec3::ZERO }
    }

    /// Advance by `dt` seconds
    pub fn step(&mut self, held: &Held, dt: f32, tuning: &MovementTuning) {
        self.vel = desired_velocity(held, self.vel, tuning);
        self.vel.y -= tuning.gravity * dt;
        self.pos += self.vel * dt;

        if self.pos.y <= 0.0 {
            self.pos.y = 0.0;
            self.vel.y = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_is_normalized() {
        let held = Held {
            forward: true,
            right: true,
            ..Default::default()
        };
        let v = planar_velocity(&held, 6.0);
        assert!((v.length() - 6.0).abs() < 1e-5);
        assert!(v.x > 0.0 && v.y < 0.0);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let held = Held {
            left: true,
            right: true,
            ..Default::default()
        };
        assert_eq!(planar_velocity(&held, 6.0), Vec2::ZERO);
    }

    #[test]
    fn test_jump_only_when_grounded() {
        let tuning = MovementTuning::default();
        let held = Held {
            jump: true,
            ..Default::default()
        };
        let grounded = desired_velocity(&held, Vec3::ZERO, &tuning);
        assert_eq!(grounded.y, tuning.jump_velocity);

        let airborne = desired_velocity(&held, Vec3::new(0.0, 3.0, 0.0), &tuning);
        assert_eq!(airborne.y, 3.0);
    }

    #[test]
    fn test_avatar_walks_and_lands() {
        let tuning = MovementTuning::default();
        let mut avatar = Avatar::new(Vec3::ZERO);
        let held = Held {
            right: true,
            jump: true,
            ..Default::default()
        };
        avatar.step(&held, 0.1, &tuning);
        assert!(avatar.pos.y > 0.0);
        assert!((avatar.pos.x - 0.6).abs() < 1e-5);

        let idle = Held::default();
        for _ in 0..100 {
            avatar.step(&idle, 0.1, &tuning);
        }
        assert_eq!(avatar.pos.y, 0.0);
        assert_eq!(avatar.vel.y, 0.0);
    }
}
