//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Stable iteration order (player one, then player two)
//! - Wall-clock effects are simulation-clock timers, never callbacks
//! - No rendering or platform dependencies

pub mod bounds;
pub mod collision;
pub mod entity;
pub mod session;
pub mod state;
pub mod tick;

pub use bounds::{ArenaBounds, Containment, keep_in_bounds, keep_in_square_bounds};
pub use collision::{
    CollisionResult, FALLBACK_NORMAL, ResolvedVelocities, check_sphere_collision, contact_normal,
    resolve_collision,
};
pub use entity::{Entity, Kinematics, MoveKeys, PlayerId};
pub use session::{FixedTimestep, Session};
pub use state::{
    DodgeEffect, GamePhase, MatchSnapshot, MatchState, PlayerSnapshot, ScoreOutcome,
};
pub use tick::{CollisionEvent, TickInput, TickReport, tick};
