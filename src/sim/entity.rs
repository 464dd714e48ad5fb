//! Player avatars and the per-tick kinematic integrator

use std::fmt;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::{from_ground_xz, ground_xz};

/// Which player owns an entity or a score
///
/// Only two players exist, so an out-of-range id cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub const ALL: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    /// Slot in per-player arrays
    #[inline]
    pub fn index(self) -> usize {
        match self {
            PlayerId::One => 0,
            PlayerId::Two => 1,
        }
    }

    #[inline]
    pub fn opponent(self) -> Self {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }

    /// 1-based player number as shown to humans
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(PlayerId::One),
            2 => Some(PlayerId::Two),
            _ => None,
        }
    }

    /// Where this player starts each round
    pub fn spawn_point(self) -> Vec3 {
        match self {
            PlayerId::One => PLAYER_ONE_SPAWN,
            PlayerId::Two => PLAYER_TWO_SPAWN,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.number())
    }
}

/// Held movement keys for one player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveKeys {
    pub left: bool,
    pub right: bool,
    /// Toward -z
    pub forward: bool,
    /// Toward +z
    pub backward: bool,
}

impl MoveKeys {
    /// Ground-plane intent (x, z); opposing keys cancel, no keys gives zero
    pub fn intent(&self) -> Vec2 {
        let mut intent = Vec2::ZERO;
        if self.left {
            intent.x -= 1.0;
        }
        if self.right {
            intent.x += 1.0;
        }
        if self.forward {
            intent.y -= 1.0;
        }
        if self.backward {
            intent.y += 1.0;
        }
        intent
    }

    /// Decode from the low 4 bits: left, right, forward, backward
    pub fn from_bits(bits: u8) -> Self {
        Self {
            left: bits & 0b0001 != 0,
            right: bits & 0b0010 != 0,
            forward: bits & 0b0100 != 0,
            backward: bits & 0b1000 != 0,
        }
    }
}

/// Movement tuning shared by every entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    /// Velocity gained per reference frame of full input
    pub move_speed: f32,
    /// Fraction of velocity kept per reference frame
    pub friction: f32,
}

impl Default for Kinematics {
    fn default() -> Self {
        Self {
            move_speed: MOVE_SPEED,
            friction: FRICTION,
        }
    }
}

/// A player avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub owner: PlayerId,
    /// Center; y stays at the ground height
    pub pos: Vec3,
    /// Ground-plane velocity in world units per reference frame (y is always 0)
    pub vel: Vec3,
    pub radius: f32,
    pub mass: f32,
}

impl Entity {
    /// A fresh avatar at the owner's spawn point
    pub fn spawn(owner: PlayerId, radius: f32, mass: f32) -> Self {
        Self {
            id: owner.number() as u32,
            owner,
            pos: owner.spawn_point(),
            vel: Vec3::ZERO,
            radius,
            mass,
        }
    }

    /// Put the avatar back at its spawn point, at rest
    pub fn respawn(&mut self) {
        self.pos = self.owner.spawn_point();
        self.vel = Vec3::ZERO;
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Advance velocity and position by `dt` seconds
    ///
    /// Acceleration, friction and displacement are all scaled by
    /// `dt / REFERENCE_DT`, so a 60 Hz step reproduces one classic per-frame
    /// update and any other step size covers the same ground per second.
    pub fn integrate(&mut self, intent: Vec2, kinematics: &Kinematics, dt: f32) {
        let frames = dt / REFERENCE_DT;
        if !frames.is_finite() || frames <= 0.0 {
            return;
        }

        let mut vel = ground_xz(self.vel);
        vel += intent * kinematics.move_speed * frames;
        vel *= kinematics.friction.powf(frames);

        let pos = ground_xz(self.pos) + vel * frames;

        self.vel = from_ground_xz(vel, 0.0);
        self.pos = from_ground_xz(pos, self.pos.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_intent_from_keys() {
        assert_eq!(MoveKeys::default().intent(), Vec2::ZERO);

        let keys = MoveKeys {
            right: true,
            forward: true,
            ..Default::default()
        };
        assert_eq!(keys.intent(), Vec2::new(1.0, -1.0));

        let opposed = MoveKeys {
            left: true,
            right: true,
            ..Default::default()
        };
        assert_eq!(opposed.intent(), Vec2::ZERO);
    }

    #[test]
    fn test_keys_from_bits() {
        let keys = MoveKeys::from_bits(0b1010);
        assert!(!keys.left);
        assert!(keys.right);
        assert!(!keys.forward);
        assert!(keys.backward);
        assert_eq!(keys.intent(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_player_ids() {
        assert_eq!(PlayerId::One.opponent(), PlayerId::Two);
        assert_eq!(PlayerId::Two.index(), 1);
        assert_eq!(PlayerId::from_number(2), Some(PlayerId::Two));
        assert_eq!(PlayerId::from_number(3), None);
        assert_eq!(PlayerId::One.to_string(), "Player 1");
    }

    #[test]
    fn test_reference_frame_matches_classic_update() {
        // One 60 Hz step: v = (v + a) * f; p += v
        let mut entity = Entity::spawn(PlayerId::One, PLAYER_RADIUS, PLAYER_MASS);
        entity.integrate(Vec2::new(1.0, 0.0), &Kinematics::default(), REFERENCE_DT);

        let expected_vel = MOVE_SPEED * FRICTION;
        assert!((entity.vel.x - expected_vel).abs() < EPS);
        assert!((entity.pos.x - (-3.0 + expected_vel)).abs() < EPS);
        assert_eq!(entity.pos.y, GROUND_HEIGHT);
        assert_eq!(entity.vel.y, 0.0);
    }

    #[test]
    fn test_friction_is_step_size_independent() {
        let kinematics = Kinematics::default();
        let mut coarse = Entity::spawn(PlayerId::Two, PLAYER_RADIUS, PLAYER_MASS);
        let mut fine = coarse.clone();
        coarse.vel = Vec3::new(-0.4, 0.0, 0.2);
        fine.vel = coarse.vel;

        coarse.integrate(Vec2::ZERO, &kinematics, REFERENCE_DT);
        fine.integrate(Vec2::ZERO, &kinematics, REFERENCE_DT / 2.0);
        fine.integrate(Vec2::ZERO, &kinematics, REFERENCE_DT / 2.0);

        assert!((coarse.vel - fine.vel).length() < EPS);
    }

    #[test]
    fn test_no_input_decays_to_rest() {
        let mut entity = Entity::spawn(PlayerId::One, PLAYER_RADIUS, PLAYER_MASS);
        entity.vel = Vec3::new(1.0, 0.0, 0.0);
        for _ in 0..600 {
            entity.integrate(Vec2::ZERO, &Kinematics::default(), SIM_DT);
        }
        assert!(entity.speed() < 1e-6);
    }

    #[test]
    fn test_zero_dt_is_noop() {
        let mut entity = Entity::spawn(PlayerId::One, PLAYER_RADIUS, PLAYER_MASS);
        entity.vel = Vec3::new(0.3, 0.0, 0.0);
        let before = entity.clone();
        entity.integrate(Vec2::new(1.0, 1.0), &Kinematics::default(), 0.0);
        assert_eq!(entity.pos, before.pos);
        assert_eq!(entity.vel, before.vel);
    }
}
