//! Fixed timestep simulation tick
//!
//! Core game loop that advances the match deterministically, in a fixed
//! order: commands, integrate, contain, collide, commit.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::{check_sphere_collision, resolve_collision};
use super::entity::{Kinematics, MoveKeys, PlayerId};
use super::state::{GamePhase, MatchState, ScoreOutcome};
use crate::config::{MatchConfig, OutOfBoundsPolicy, ScoreAttribution};
use crate::consts::SPEED_TIE_EPSILON;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    /// Held movement keys, indexed by [`PlayerId::index`]
    pub players: [MoveKeys; 2],
    /// Start a match from the menu or after a match ended
    pub start: bool,
    /// Restart the current match from scratch
    pub restart: bool,
    /// Return to the menu
    pub menu: bool,
}

impl TickInput {
    /// Decode a packed key bitmask
    ///
    /// Bits 0-3 are player one (left, right, forward, backward), bits 4-7
    /// player two, then start, restart, menu.
    pub fn from_bits(bits: u16) -> Self {
        Self {
            players: [
                MoveKeys::from_bits((bits & 0x0f) as u8),
                MoveKeys::from_bits(((bits >> 4) & 0x0f) as u8),
            ],
            start: bits & (1 << 8) != 0,
            restart: bits & (1 << 9) != 0,
            menu: bits & (1 << 10) != 0,
        }
    }
}

/// A resolved contact between the two avatars
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    /// Unit vector from player one toward player two
    pub normal: Vec3,
    pub penetration: f32,
    /// Midpoint between the two centers after separation
    pub contact_point: Vec3,
    /// Speeds before the impulse, indexed by [`PlayerId::index`]
    pub speeds_before: [f32; 2],
    /// Speeds after the impulse
    pub speeds_after: [f32; 2],
    /// Who was awarded the point, if anyone
    pub scorer: Option<PlayerId>,
}

/// Everything observers may want to react to after a tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Player hit the arena edge this tick and was clamped
    pub out_of_bounds: [bool; 2],
    pub collision: Option<CollisionEvent>,
    /// Points awarded this tick, in the order they landed
    pub scored: Vec<PlayerId>,
    /// New phase, if the tick changed it
    pub phase_changed: Option<GamePhase>,
}

/// Pick the scorer of a collision, `None` on a tie
fn attribute_point(speeds: [f32; 2]) -> Option<PlayerId> {
    let [one, two] = speeds;
    if one > two + SPEED_TIE_EPSILON {
        Some(PlayerId::One)
    } else if two > one + SPEED_TIE_EPSILON {
        Some(PlayerId::Two)
    } else {
        None
    }
}

/// Apply menu/start/restart commands, returning the resulting phase if it moved
fn apply_commands(state: &mut MatchState, input: &TickInput) -> Option<GamePhase> {
    let before = state.phase;

    if input.menu {
        state.show_menu();
    } else if input.restart && state.phase != GamePhase::Menu {
        state.reset_game();
    } else if input.start && state.phase != GamePhase::Playing {
        state.start_game();
    } else {
        return None;
    }

    (state.phase != before || input.restart).then_some(state.phase)
}

/// Record a point in the report and return whether the match just ended
fn award(state: &mut MatchState, player: PlayerId, report: &mut TickReport) -> bool {
    match state.increment_score(player) {
        ScoreOutcome::Scored { .. } => {
            report.scored.push(player);
            false
        }
        ScoreOutcome::Won { .. } => {
            report.scored.push(player);
            report.phase_changed = Some(GamePhase::Ended);
            true
        }
        ScoreOutcome::Ignored => false,
    }
}

/// Advance the match by one fixed timestep
pub fn tick(
    state: &mut MatchState,
    config: &MatchConfig,
    input: &TickInput,
    dt: f32,
) -> TickReport {
    let mut report = TickReport {
        phase_changed: apply_commands(state, input),
        ..Default::default()
    };

    if state.phase != GamePhase::Playing {
        return report;
    }

    state.advance_clock(dt);
    state.expire_effects();

    let bounds = config.bounds();
    let kinematics = Kinematics {
        move_speed: config.move_speed,
        friction: config.friction,
    };

    // Integrate and contain each avatar
    for player in PlayerId::ALL {
        let intent = input.players[player.index()].intent();
        let entity = state.entity_mut(player);
        entity.integrate(intent, &kinematics, dt);

        let contained = bounds.contain(entity.pos, entity.radius);
        entity.pos = contained.position;
        report.out_of_bounds[player.index()] = contained.out_of_bounds;
    }

    if config.out_of_bounds == OutOfBoundsPolicy::ScoreOpponent {
        for player in PlayerId::ALL {
            if !report.out_of_bounds[player.index()]
                || !state.exit_ready(player, config.collision_debounce)
            {
                continue;
            }
            state.record_exit(player);
            log::debug!("{} left the arena", player);
            if award(state, player.opponent(), &mut report) {
                return report;
            }
        }
    }

    // Pairwise contact between the two avatars
    let [a, b] = &state.entities;
    let contact = check_sphere_collision(a.pos, a.radius, b.pos, b.radius);
    if !contact.collided || !state.collision_ready(config.collision_debounce) {
        return report;
    }

    let speeds_before = [a.speed(), b.speed()];
    let resolved = resolve_collision(
        a.pos,
        a.vel,
        a.mass,
        b.pos,
        b.vel,
        b.mass,
        config.restitution,
    );

    let separation = contact.normal * (contact.penetration * 0.5);
    {
        let [a, b] = &mut state.entities;
        a.vel = resolved.vel_a;
        b.vel = resolved.vel_b;
        a.pos = bounds.contain(a.pos - separation, a.radius).position;
        b.pos = bounds.contain(b.pos + separation, b.radius).position;
    }
    state.record_collision();

    let [a, b] = &state.entities;
    let speeds_after = [a.speed(), b.speed()];
    let contact_point = (a.pos + b.pos) * 0.5;
    let scorer = attribute_point(match config.attribution {
        ScoreAttribution::PostImpactSpeed => speeds_after,
        ScoreAttribution::ApproachSpeed => speeds_before,
    });

    log::debug!(
        "Collision at t={:.2}s speeds {:?} -> {:?}, point: {:?}",
        state.clock,
        speeds_before,
        speeds_after,
        scorer
    );

    report.collision = Some(CollisionEvent {
        normal: contact.normal,
        penetration: contact.penetration,
        contact_point,
        speeds_before,
        speeds_after,
        scorer,
    });

    if let Some(player) = scorer {
        let struck = player.opponent();
        let direction = state.entity(struck).vel.normalize_or_zero();
        state.trigger_dodge(struck, direction);
        award(state, player, &mut report);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::bounds::ArenaBounds;

    fn playing_state(config: &MatchConfig) -> MatchState {
        let mut state = MatchState::new(config.win_score, config.player_radius, config.player_mass);
        state.start_game();
        state
    }

    fn hold(one: MoveKeys, two: MoveKeys) -> TickInput {
        TickInput {
            players: [one, two],
            ..Default::default()
        }
    }

    const RIGHT: MoveKeys = MoveKeys {
        left: false,
        right: true,
        forward: false,
        backward: false,
    };
    const LEFT: MoveKeys = MoveKeys {
        left: true,
        right: false,
        forward: false,
        backward: false,
    };

    #[test]
    fn test_menu_does_not_simulate() {
        let config = MatchConfig::default();
        let mut state = MatchState::new(WIN_SCORE, PLAYER_RADIUS, PLAYER_MASS);

        let report = tick(&mut state, &config, &hold(RIGHT, LEFT), SIM_DT);
        assert_eq!(report, TickReport::default());
        assert_eq!(state.entity(PlayerId::One).pos, PLAYER_ONE_SPAWN);
        assert_eq!(state.clock, 0.0);
    }

    #[test]
    fn test_start_command() {
        let config = MatchConfig::default();
        let mut state = MatchState::new(WIN_SCORE, PLAYER_RADIUS, PLAYER_MASS);

        let input = TickInput {
            start: true,
            ..Default::default()
        };
        let report = tick(&mut state, &config, &input, SIM_DT);
        assert_eq!(report.phase_changed, Some(GamePhase::Playing));
        assert_eq!(state.phase, GamePhase::Playing);

        // Start while playing is a no-op
        let report = tick(&mut state, &config, &input, SIM_DT);
        assert_eq!(report.phase_changed, None);
    }

    #[test]
    fn test_menu_command() {
        let config = MatchConfig::default();
        let mut state = playing_state(&config);

        let input = TickInput {
            menu: true,
            ..Default::default()
        };
        let report = tick(&mut state, &config, &input, SIM_DT);
        assert_eq!(report.phase_changed, Some(GamePhase::Menu));
        assert_eq!(state.phase, GamePhase::Menu);
    }

    #[test]
    fn test_head_on_collision_inverts_velocities() {
        let config = MatchConfig::default();
        let mut state = playing_state(&config);
        // Coasting at equal speed: enough to meet, slow enough not to tunnel
        state.entity_mut(PlayerId::One).vel = Vec3::new(0.6, 0.0, 0.0);
        state.entity_mut(PlayerId::Two).vel = Vec3::new(-0.6, 0.0, 0.0);

        let mut event = None;
        for _ in 0..480 {
            let report = tick(&mut state, &config, &TickInput::default(), SIM_DT);
            if let Some(collision) = report.collision {
                event = Some(collision);
                break;
            }
        }
        let event = event.expect("avatars should meet");

        // Met near the midpoint
        assert!(event.contact_point.x.abs() < 0.05);
        assert!((event.normal - Vec3::X).length() < 1e-4);

        // Each bounced back with ~90% of its approach speed
        let one = state.entity(PlayerId::One).vel.x;
        let two = state.entity(PlayerId::Two).vel.x;
        assert!(one < 0.0 && two > 0.0);
        let ratio = one.abs() / event.speeds_before[0];
        assert!((ratio - RESTITUTION).abs() < 1e-3);

        // Symmetric hit: nobody scores
        assert_eq!(event.scorer, None);
        assert!(state.scores() == [0, 0]);

        // Bodies no longer overlap after separation
        let gap = state.entity(PlayerId::One).pos.distance(state.entity(PlayerId::Two).pos);
        assert!(gap >= 2.0 * PLAYER_RADIUS - 1e-4);
    }

    #[test]
    fn test_collision_debounced() {
        let config = MatchConfig::default();
        let mut state = playing_state(&config);
        // Stack the avatars so they overlap every tick
        state.entity_mut(PlayerId::One).pos = Vec3::new(-0.2, GROUND_HEIGHT, 0.0);
        state.entity_mut(PlayerId::Two).pos = Vec3::new(0.2, GROUND_HEIGHT, 0.0);

        let input = hold(RIGHT, LEFT);
        let mut resolutions = 0;
        // 0.5s of ticks: only the first contact may resolve
        for _ in 0..60 {
            if tick(&mut state, &config, &input, SIM_DT).collision.is_some() {
                resolutions += 1;
            }
        }
        assert_eq!(resolutions, 1);
    }

    #[test]
    fn test_post_impact_attribution() {
        let config = MatchConfig::default();
        let mut state = playing_state(&config);
        state.entity_mut(PlayerId::One).pos = Vec3::new(-0.45, GROUND_HEIGHT, 0.0);
        state.entity_mut(PlayerId::Two).pos = Vec3::new(0.45, GROUND_HEIGHT, 0.0);
        state.entity_mut(PlayerId::One).vel = Vec3::new(0.5, 0.0, 0.0);

        let report = tick(&mut state, &config, &TickInput::default(), SIM_DT);
        let event = report.collision.expect("overlapping avatars collide");

        // The struck avatar carries the momentum away and is faster afterwards
        assert_eq!(event.scorer, Some(PlayerId::Two));
        assert_eq!(report.scored, vec![PlayerId::Two]);
        assert_eq!(state.score(PlayerId::Two), 1);
        assert!(state.dodge(PlayerId::One).is_some());
    }

    #[test]
    fn test_approach_attribution() {
        let config = MatchConfig {
            attribution: ScoreAttribution::ApproachSpeed,
            ..Default::default()
        };
        let mut state = playing_state(&config);
        state.entity_mut(PlayerId::One).pos = Vec3::new(-0.45, GROUND_HEIGHT, 0.0);
        state.entity_mut(PlayerId::Two).pos = Vec3::new(0.45, GROUND_HEIGHT, 0.0);
        state.entity_mut(PlayerId::One).vel = Vec3::new(0.5, 0.0, 0.0);

        let report = tick(&mut state, &config, &TickInput::default(), SIM_DT);
        assert_eq!(report.scored, vec![PlayerId::One]);
        assert!(state.dodge(PlayerId::Two).is_some());
    }

    #[test]
    fn test_clamp_policy_flags_without_scoring() {
        let config = MatchConfig::default();
        let mut state = playing_state(&config);
        state.entity_mut(PlayerId::One).pos = Vec3::new(-6.9, GROUND_HEIGHT, 0.0);
        state.entity_mut(PlayerId::One).vel = Vec3::new(-1.0, 0.0, 0.0);

        let report = tick(&mut state, &config, &TickInput::default(), SIM_DT);
        assert!(report.out_of_bounds[0]);
        assert!(!report.out_of_bounds[1]);
        assert!(report.scored.is_empty());
        assert!(config.bounds().contains(state.entity(PlayerId::One).pos, PLAYER_RADIUS));
    }

    #[test]
    fn test_score_on_exit_policy() {
        let config = MatchConfig {
            out_of_bounds: OutOfBoundsPolicy::ScoreOpponent,
            ..Default::default()
        };
        let mut state = playing_state(&config);
        state.entity_mut(PlayerId::One).pos = Vec3::new(-6.9, GROUND_HEIGHT, 0.0);
        state.entity_mut(PlayerId::One).vel = Vec3::new(-1.0, 0.0, 0.0);

        let report = tick(&mut state, &config, &TickInput::default(), SIM_DT);
        assert_eq!(report.scored, vec![PlayerId::Two]);

        // Pinned against the wall: no repeat point inside the debounce window
        let input = hold(LEFT, MoveKeys::default());
        let report = tick(&mut state, &config, &input, SIM_DT);
        assert!(report.out_of_bounds[0]);
        assert!(report.scored.is_empty());
        assert_eq!(state.score(PlayerId::Two), 1);
    }

    #[test]
    fn test_both_exits_score_in_one_tick() {
        let config = MatchConfig {
            out_of_bounds: OutOfBoundsPolicy::ScoreOpponent,
            ..Default::default()
        };
        let mut state = playing_state(&config);
        state.entity_mut(PlayerId::One).pos = Vec3::new(-6.9, GROUND_HEIGHT, 0.0);
        state.entity_mut(PlayerId::One).vel = Vec3::new(-1.0, 0.0, 0.0);
        state.entity_mut(PlayerId::Two).pos = Vec3::new(6.9, GROUND_HEIGHT, 0.0);
        state.entity_mut(PlayerId::Two).vel = Vec3::new(1.0, 0.0, 0.0);

        let report = tick(&mut state, &config, &TickInput::default(), SIM_DT);
        assert_eq!(report.out_of_bounds, [true, true]);
        assert_eq!(report.scored, vec![PlayerId::Two, PlayerId::One]);
        assert_eq!(state.scores(), [1, 1]);
    }

    #[test]
    fn test_square_arena_containment() {
        let config = MatchConfig {
            arena: crate::config::ArenaShape::Square {
                size: SQUARE_ARENA_SIZE,
            },
            ..Default::default()
        };
        let mut state = playing_state(&config);
        let input = hold(LEFT, MoveKeys {
            backward: true,
            right: true,
            ..Default::default()
        });

        for _ in 0..1200 {
            tick(&mut state, &config, &input, SIM_DT);
            for entity in &state.entities {
                assert!(config.bounds().contains(entity.pos, entity.radius));
            }
        }
        // Player one pinned to the left wall
        let half = SQUARE_ARENA_SIZE / 2.0 - PLAYER_RADIUS;
        assert!((state.entity(PlayerId::One).pos.x + half).abs() < 1e-4);
        assert!(matches!(config.bounds(), ArenaBounds::Square { .. }));
    }

    #[test]
    fn test_input_bits() {
        let input = TickInput::from_bits(0b0000_0001_0100_0010 | (1 << 10));
        assert!(input.players[0].right);
        assert!(input.players[1].forward);
        assert!(input.start);
        assert!(!input.restart);
        assert!(input.menu);
    }

    #[test]
    fn test_determinism() {
        let config = MatchConfig::default();
        let mut state1 = playing_state(&config);
        let mut state2 = playing_state(&config);

        let inputs = [
            hold(RIGHT, LEFT),
            hold(RIGHT, MoveKeys::default()),
            hold(MoveKeys::default(), LEFT),
            TickInput::default(),
        ];

        for _ in 0..200 {
            for input in &inputs {
                let r1 = tick(&mut state1, &config, input, SIM_DT);
                let r2 = tick(&mut state2, &config, input, SIM_DT);
                assert_eq!(r1, r2);
            }
        }

        assert_eq!(state1.snapshot(), state2.snapshot());
    }
}
