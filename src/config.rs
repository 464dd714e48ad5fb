//! Match configuration
//!
//! Data-driven tuning for a match, loadable from JSON. Every field has a
//! default, so a config file only needs the values it changes.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::ArenaBounds;

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of its allowed range
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Arena outline, centered on the origin at ground height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ArenaShape {
    Circle { radius: f32 },
    /// `size` is the full side length
    Square { size: f32 },
}

impl Default for ArenaShape {
    fn default() -> Self {
        ArenaShape::Circle {
            radius: ARENA_RADIUS,
        }
    }
}

/// What happens when an avatar is pushed back from the arena edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfBoundsPolicy {
    /// Clamp silently
    #[default]
    Clamp,
    /// Clamp and give the opponent a point (debounced per player)
    ScoreOpponent,
}

/// Who earns the point from a collision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreAttribution {
    /// The avatar moving faster after the impulse
    #[default]
    PostImpactSpeed,
    /// The avatar that came in faster
    ApproachSpeed,
}

/// Tuning for one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub arena: ArenaShape,
    pub player_radius: f32,
    pub player_mass: f32,
    /// Velocity gained per reference frame of held input
    pub move_speed: f32,
    /// Velocity kept per reference frame, in (0, 1]
    pub friction: f32,
    /// Collision elasticity, in [0, 1]
    pub restitution: f32,
    /// Seconds between two resolved collisions
    pub collision_debounce: f32,
    pub win_score: u32,
    pub out_of_bounds: OutOfBoundsPolicy,
    pub attribution: ScoreAttribution,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            arena: ArenaShape::default(),
            player_radius: PLAYER_RADIUS,
            player_mass: PLAYER_MASS,
            move_speed: MOVE_SPEED,
            friction: FRICTION,
            restitution: RESTITUTION,
            collision_debounce: COLLISION_DEBOUNCE,
            win_score: WIN_SCORE,
            out_of_bounds: OutOfBoundsPolicy::default(),
            attribution: ScoreAttribution::default(),
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn finite(field: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid(field, format!("{value} is not a finite number")))
    }
}

impl MatchConfig {
    /// Arena boundary in world space
    pub fn bounds(&self) -> ArenaBounds {
        let center = Vec3::new(0.0, GROUND_HEIGHT, 0.0);
        match self.arena {
            ArenaShape::Circle { radius } => ArenaBounds::Circle { center, radius },
            ArenaShape::Square { size } => ArenaBounds::Square { center, size },
        }
    }

    /// Check every value is usable by the simulation
    pub fn validate(&self) -> Result<(), ConfigError> {
        let radius = finite("player_radius", self.player_radius)?;
        if radius <= 0.0 {
            return Err(invalid("player_radius", "must be positive"));
        }

        let mass = finite("player_mass", self.player_mass)?;
        if mass <= 0.0 {
            return Err(invalid("player_mass", "must be positive"));
        }

        if finite("move_speed", self.move_speed)? < 0.0 {
            return Err(invalid("move_speed", "must not be negative"));
        }

        let friction = finite("friction", self.friction)?;
        if friction <= 0.0 || friction > 1.0 {
            return Err(invalid("friction", format!("{friction} is outside (0, 1]")));
        }

        let restitution = finite("restitution", self.restitution)?;
        if !(0.0..=1.0).contains(&restitution) {
            return Err(invalid(
                "restitution",
                format!("{restitution} is outside [0, 1]"),
            ));
        }

        if finite("collision_debounce", self.collision_debounce)? < 0.0 {
            return Err(invalid("collision_debounce", "must not be negative"));
        }

        if self.win_score == 0 {
            return Err(invalid("win_score", "must be at least 1"));
        }

        // Both avatars must fit side by side at their spawn points
        let spawn_reach = PLAYER_ONE_SPAWN.x.abs().max(PLAYER_TWO_SPAWN.x.abs()) + radius;
        match self.arena {
            ArenaShape::Circle { radius: arena } => {
                if finite("arena.radius", arena)? < spawn_reach {
                    return Err(invalid(
                        "arena.radius",
                        format!("{arena} cannot hold the spawn layout (needs {spawn_reach})"),
                    ));
                }
            }
            ArenaShape::Square { size } => {
                if finite("arena.size", size)? / 2.0 < spawn_reach {
                    let needed = spawn_reach * 2.0;
                    return Err(invalid(
                        "arena.size",
                        format!("{size} cannot hold the spawn layout (needs {needed})"),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded match config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
