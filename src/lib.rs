//! Cursor Clash - a 2-player arena bumper game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (containment, collisions, match state)
//! - `config`: Data-driven match tuning
//! - `achievements`: Tournament stats and achievement unlocks
//!
//! Rendering, audio and UI are external collaborators: they feed a
//! [`sim::TickInput`] in and read [`sim::MatchSnapshot`]s and
//! [`sim::TickReport`]s out.

pub mod achievements;
pub mod config;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use achievements::{Achievement, Achievements, MatchRecorder, TournamentStats};
pub use config::{ArenaShape, ConfigError, MatchConfig, OutOfBoundsPolicy, ScoreAttribution};

use glam::{Vec2, Vec3};

/// Game configuration constants
pub mod consts {
    use glam::Vec3;

    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest wall-clock frame the stepper will accept (tab switches etc.)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Frame length the movement constants were tuned against (60 fps)
    pub const REFERENCE_DT: f32 = 1.0 / 60.0;

    /// Arena dimensions
    pub const ARENA_RADIUS: f32 = 7.5;
    pub const SQUARE_ARENA_SIZE: f32 = 16.0;
    /// Height of the ground plane entity centers ride on
    pub const GROUND_HEIGHT: f32 = 0.5;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 0.5;
    pub const PLAYER_MASS: f32 = 1.0;
    /// Velocity gained per reference frame of held input
    pub const MOVE_SPEED: f32 = 0.15;
    /// Velocity retained per reference frame
    pub const FRICTION: f32 = 0.85;
    pub const RESTITUTION: f32 = 0.9;

    /// Spawn points for the initial layout
    pub const PLAYER_ONE_SPAWN: Vec3 = Vec3::new(-3.0, GROUND_HEIGHT, 0.0);
    pub const PLAYER_TWO_SPAWN: Vec3 = Vec3::new(3.0, GROUND_HEIGHT, 0.0);

    /// Match rules
    pub const WIN_SCORE: u32 = 5;
    /// Seconds between two resolved collisions
    pub const COLLISION_DEBOUNCE: f32 = 0.5;
    /// Speed difference below which a collision awards no point
    pub const SPEED_TIE_EPSILON: f32 = 0.1;
    /// How long a dodge effect stays visible (seconds)
    pub const DODGE_EFFECT_DURATION: f32 = 0.5;
}

/// Project a world-space vector onto the ground plane (x, z)
#[inline]
pub fn ground_xz(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Lift a ground-plane vector back into world space at height `y`
#[inline]
pub fn from_ground_xz(v: Vec2, y: f32) -> Vec3 {
    Vec3::new(v.x, y, v.y)
}
