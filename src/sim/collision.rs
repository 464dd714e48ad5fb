//! Sphere collision detection and impulse response
//!
//! Both avatars are spheres riding the ground plane, so contact is a plain
//! center-distance test. Response is a single normal impulse with a
//! restitution coefficient; there is no friction or spin transfer.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Contact normal used when two centers coincide and no direction exists
pub const FALLBACK_NORMAL: Vec3 = Vec3::X;

/// Center distance below which two spheres are treated as coincident
const COINCIDENT_EPSILON: f32 = 1e-6;

/// Result of a collision check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionResult {
    /// Whether the spheres overlap
    pub collided: bool,
    /// Unit vector from sphere A toward sphere B (zero on a miss)
    pub normal: Vec3,
    /// Overlap depth along the normal (zero on a miss)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            collided: false,
            normal: Vec3::ZERO,
            penetration: 0.0,
        }
    }
}

/// Post-impulse velocities for both bodies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedVelocities {
    pub vel_a: Vec3,
    pub vel_b: Vec3,
}

/// Unit vector pointing from `from` toward `to`
///
/// Falls back to [`FALLBACK_NORMAL`] when the points coincide (or the
/// distance is not finite) so NaN never leaks into entity state.
#[inline]
pub fn contact_normal(from: Vec3, to: Vec3) -> Vec3 {
    let delta = to - from;
    let distance = delta.length();
    if distance.is_finite() && distance > COINCIDENT_EPSILON {
        delta / distance
    } else {
        FALLBACK_NORMAL
    }
}

/// Check whether two spheres overlap
///
/// Touching spheres (`d == ra + rb`) do not collide.
pub fn check_sphere_collision(
    pos_a: Vec3,
    radius_a: f32,
    pos_b: Vec3,
    radius_b: f32,
) -> CollisionResult {
    let distance = pos_a.distance(pos_b);
    let min_distance = radius_a + radius_b;

    if distance < min_distance {
        return CollisionResult {
            collided: true,
            normal: contact_normal(pos_a, pos_b),
            penetration: min_distance - distance,
        };
    }

    CollisionResult::miss()
}

/// Inverse mass, with non-positive or non-finite mass treated as immovable
#[inline]
fn inverse_mass(mass: f32) -> f32 {
    if mass.is_finite() && mass > 0.0 {
        1.0 / mass
    } else {
        0.0
    }
}

/// Resolve an elastic collision between two bodies with a normal impulse
///
/// `j = -(1 + e)(v_rel · n) / (1/ma + 1/mb)`, applied as `+j·n/ma` to A and
/// `-j·n/mb` to B, where `n` points from A to B and `v_rel = vel_a - vel_b`.
///
/// Contacts that are separating or at rest along the normal are returned
/// unchanged. Restitution is clamped to `[0, 1]`.
pub fn resolve_collision(
    pos_a: Vec3,
    vel_a: Vec3,
    mass_a: f32,
    pos_b: Vec3,
    vel_b: Vec3,
    mass_b: f32,
    restitution: f32,
) -> ResolvedVelocities {
    let unchanged = ResolvedVelocities { vel_a, vel_b };

    let normal = contact_normal(pos_a, pos_b);
    let relative_velocity = vel_a - vel_b;
    // Positive means A is closing on B
    let velocity_along_normal = relative_velocity.dot(normal);
    if !velocity_along_normal.is_finite() || velocity_along_normal <= 0.0 {
        return unchanged;
    }

    let inv_a = inverse_mass(mass_a);
    let inv_b = inverse_mass(mass_b);
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return unchanged;
    }

    let restitution = if restitution.is_nan() {
        0.0
    } else {
        restitution.clamp(0.0, 1.0)
    };

    let impulse = -(1.0 + restitution) * velocity_along_normal / inv_sum;
    let impulse_vec = normal * impulse;

    ResolvedVelocities {
        vel_a: vel_a + impulse_vec * inv_a,
        vel_b: vel_b - impulse_vec * inv_b,
    }
}
