//! Match state and the phase machine
//!
//! One `MatchState` is owned by the simulation loop. Presentation layers
//! read [`MatchSnapshot`]s instead of touching it.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, PlayerId};
use crate::consts::*;

/// Current phase of the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, nothing simulates
    Menu,
    /// Active gameplay
    Playing,
    /// Someone reached the win score
    Ended,
}

/// A timed "dodge" highlight on one player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DodgeEffect {
    /// Simulation time the effect began (seconds)
    pub started_at: f32,
    pub direction: Vec3,
}

impl DodgeEffect {
    #[inline]
    pub fn is_active(&self, now: f32) -> bool {
        now - self.started_at < DODGE_EFFECT_DURATION
    }
}

/// What a call to [`MatchState::increment_score`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOutcome {
    Scored { player: PlayerId, score: u32 },
    /// The point reached the win score and ended the match
    Won { player: PlayerId },
    /// Not playing; nothing changed
    Ignored,
}

/// Complete match state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchState {
    pub phase: GamePhase,
    /// Avatars indexed by [`PlayerId::index`]
    pub entities: [Entity; 2],
    scores: [u32; 2],
    pub win_score: u32,
    pub winner: Option<PlayerId>,
    /// Simulation clock (seconds since the match started)
    pub clock: f32,
    /// Clock time of the last resolved collision
    pub last_collision: Option<f32>,
    /// Clock time each player last scored an exit for the opponent
    pub last_exit: [Option<f32>; 2],
    dodges: [Option<DodgeEffect>; 2],
}

impl MatchState {
    /// A new match sitting on the menu
    pub fn new(win_score: u32, player_radius: f32, player_mass: f32) -> Self {
        debug_assert!(win_score > 0, "win score must be positive");
        Self {
            phase: GamePhase::Menu,
            entities: [
                Entity::spawn(PlayerId::One, player_radius, player_mass),
                Entity::spawn(PlayerId::Two, player_radius, player_mass),
            ],
            scores: [0; 2],
            win_score,
            winner: None,
            clock: 0.0,
            last_collision: None,
            last_exit: [None; 2],
            dodges: [None; 2],
        }
    }

    /// Reset everything a round owns (layout, scores, timers)
    fn reset_round(&mut self) {
        for entity in &mut self.entities {
            entity.respawn();
        }
        self.scores = [0; 2];
        self.winner = None;
        self.clock = 0.0;
        self.last_collision = None;
        self.last_exit = [None; 2];
        self.dodges = [None; 2];
    }

    /// Start a fresh match
    pub fn start_game(&mut self) {
        self.reset_round();
        self.phase = GamePhase::Playing;
        log::info!("Match started (first to {})", self.win_score);
    }

    /// Restart from any phase; same as starting a fresh match
    pub fn reset_game(&mut self) {
        self.start_game();
    }

    /// Back to the title screen
    pub fn show_menu(&mut self) {
        self.reset_round();
        self.phase = GamePhase::Menu;
        log::info!("Returned to menu");
    }

    /// Terminal transition with a winner
    pub fn end_game(&mut self, winner: PlayerId) {
        self.phase = GamePhase::Ended;
        self.winner = Some(winner);
        log::info!(
            "{} wins {}-{}",
            winner,
            self.score(winner),
            self.score(winner.opponent())
        );
    }

    /// Award one point; ends the match when the win score is reached
    ///
    /// Only counts while playing, so a point can never land after the match
    /// is decided and no score exceeds the win score.
    pub fn increment_score(&mut self, player: PlayerId) -> ScoreOutcome {
        if self.phase != GamePhase::Playing {
            log::debug!("Ignoring point for {} in {:?}", player, self.phase);
            return ScoreOutcome::Ignored;
        }

        let score = &mut self.scores[player.index()];
        *score += 1;
        let score = *score;
        debug_assert!(score <= self.win_score);
        log::debug!("{} scores ({})", player, score);

        if score >= self.win_score {
            self.end_game(player);
            return ScoreOutcome::Won { player };
        }

        ScoreOutcome::Scored { player, score }
    }

    #[inline]
    pub fn score(&self, player: PlayerId) -> u32 {
        self.scores[player.index()]
    }

    pub fn scores(&self) -> [u32; 2] {
        self.scores
    }

    #[inline]
    pub fn entity(&self, player: PlayerId) -> &Entity {
        &self.entities[player.index()]
    }

    #[inline]
    pub fn entity_mut(&mut self, player: PlayerId) -> &mut Entity {
        &mut self.entities[player.index()]
    }

    /// Advance the simulation clock
    pub fn advance_clock(&mut self, dt: f32) {
        self.clock += dt;
    }

    /// Whether the collision debounce window has passed
    pub fn collision_ready(&self, debounce: f32) -> bool {
        self.last_collision.is_none_or(|last| self.clock - last > debounce)
    }

    pub fn record_collision(&mut self) {
        self.last_collision = Some(self.clock);
    }

    /// Whether `player` leaving the arena may score again
    pub fn exit_ready(&self, player: PlayerId, debounce: f32) -> bool {
        self.last_exit[player.index()].is_none_or(|last| self.clock - last > debounce)
    }

    pub fn record_exit(&mut self, player: PlayerId) {
        self.last_exit[player.index()] = Some(self.clock);
    }

    /// Show a dodge on `player`, replacing any effect still running
    pub fn trigger_dodge(&mut self, player: PlayerId, direction: Vec3) {
        self.dodges[player.index()] = Some(DodgeEffect {
            started_at: self.clock,
            direction,
        });
    }

    /// The player's dodge effect, if still active
    pub fn dodge(&self, player: PlayerId) -> Option<DodgeEffect> {
        self.dodges[player.index()].filter(|d| d.is_active(self.clock))
    }

    /// Drop effects whose time has run out
    pub fn expire_effects(&mut self) {
        let now = self.clock;
        for slot in &mut self.dodges {
            if slot.is_some_and(|d| !d.is_active(now)) {
                *slot = None;
            }
        }
    }

    /// Read-only view for renderers, audio and UI
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            phase: self.phase,
            scores: self.scores,
            win_score: self.win_score,
            winner: self.winner,
            clock: self.clock,
            players: PlayerId::ALL.map(|id| {
                let entity = self.entity(id);
                PlayerSnapshot {
                    id,
                    position: entity.pos,
                    velocity: entity.vel,
                    radius: entity.radius,
                    score: self.score(id),
                    dodge: self.dodge(id),
                }
            }),
        }
    }
}

/// Per-player part of a [`MatchSnapshot`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
    pub score: u32,
    pub dodge: Option<DodgeEffect>,
}

/// Copy of the match state handed to observers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub phase: GamePhase,
    pub scores: [u32; 2],
    pub win_score: u32,
    pub winner: Option<PlayerId>,
    pub clock: f32,
    pub players: [PlayerSnapshot; 2],
}

impl MatchSnapshot {
    pub fn player(&self, id: PlayerId) -> &PlayerSnapshot {
        &self.players[id.index()]
    }
}
