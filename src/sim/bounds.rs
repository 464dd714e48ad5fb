//! Arena boundary containment
//!
//! Containment only ever looks at the ground plane (x, z). An entity's height
//! is left alone so callers can keep it pinned to the ground.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ground_xz;

/// Relative overshoot on the circular boundary still treated as float noise
/// rather than an exit
const BOUNDARY_EPSILON: f32 = 1e-5;

/// A contained position plus whether the input had to be moved
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Containment {
    pub position: Vec3,
    /// The input was outside the boundary by more than float noise
    pub out_of_bounds: bool,
}

/// Keep an object inside a circular arena
///
/// If the object's center is further than `radius - object_radius` from the
/// arena center, it is pulled back along the same direction to that
/// distance. An object wider than the arena collapses onto the center.
/// The returned position is never further out than the limit, so containing
/// it again leaves it unchanged.
pub fn keep_in_bounds(
    position: Vec3,
    center: Vec3,
    radius: f32,
    object_radius: f32,
) -> Containment {
    let max_distance = (radius - object_radius).max(0.0);
    let offset = ground_xz(position - center);
    let distance = offset.length();

    if distance <= max_distance || distance.is_nan() {
        return Containment {
            position,
            out_of_bounds: false,
        };
    }

    let direction = offset.normalize_or_zero();
    let place = |reach: f32| {
        let clamped = direction * reach;
        Vec3::new(center.x + clamped.x, position.y, center.z + clamped.y)
    };

    // Rounding can leave the projection a hair outside; shrink until it reads
    // as inside
    let mut reach = max_distance;
    let mut shrink = f32::EPSILON;
    let mut contained = place(reach);
    for _ in 0..16 {
        if ground_xz(contained - center).length() <= max_distance {
            break;
        }
        reach *= 1.0 - shrink;
        shrink *= 2.0;
        contained = place(reach);
    }

    let slack = BOUNDARY_EPSILON * max_distance.max(1.0);
    Containment {
        position: contained,
        out_of_bounds: distance > max_distance + slack,
    }
}

/// Keep an object inside an axis-aligned square arena
///
/// `size` is the full side length. x and z are clamped independently to
/// `center ± (size / 2 - object_radius)`.
pub fn keep_in_square_bounds(
    position: Vec3,
    center: Vec3,
    size: f32,
    object_radius: f32,
) -> Containment {
    let half_size = (size / 2.0 - object_radius).max(0.0);
    let mut contained = position;
    let mut out_of_bounds = false;

    if contained.x > center.x + half_size {
        contained.x = center.x + half_size;
        out_of_bounds = true;
    } else if contained.x < center.x - half_size {
        contained.x = center.x - half_size;
        out_of_bounds = true;
    }

    if contained.z > center.z + half_size {
        contained.z = center.z + half_size;
        out_of_bounds = true;
    } else if contained.z < center.z - half_size {
        contained.z = center.z - half_size;
        out_of_bounds = true;
    }

    Containment {
        position: contained,
        out_of_bounds,
    }
}

/// The arena's playable region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ArenaBounds {
    Circle { center: Vec3, radius: f32 },
    /// Axis-aligned square; `size` is the full side length
    Square { center: Vec3, size: f32 },
}

impl ArenaBounds {
    /// Project `position` back inside the arena
    pub fn contain(&self, position: Vec3, object_radius: f32) -> Containment {
        match *self {
            ArenaBounds::Circle { center, radius } => {
                keep_in_bounds(position, center, radius, object_radius)
            }
            ArenaBounds::Square { center, size } => {
                keep_in_square_bounds(position, center, size, object_radius)
            }
        }
    }

    /// Whether an object at `position` is already inside (or on) the boundary
    pub fn contains(&self, position: Vec3, object_radius: f32) -> bool {
        !self.contain(position, object_radius).out_of_bounds
    }

    pub fn center(&self) -> Vec3 {
        match *self {
            ArenaBounds::Circle { center, .. } | ArenaBounds::Square { center, .. } => center,
        }
    }
}
