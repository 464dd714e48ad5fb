//! Simulation loop ownership
//!
//! A `Session` is the single writer of match state. Frame deltas go in,
//! fixed ticks come out.

use super::state::{MatchSnapshot, MatchState};
use super::tick::{TickInput, TickReport, tick};
use crate::config::MatchConfig;
use crate::consts::*;

/// Accumulates wall-clock frame time into fixed simulation steps
#[derive(Debug, Clone, Default)]
pub struct FixedTimestep {
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a frame's elapsed time and return how many ticks to run
    ///
    /// Long frames are clamped and the substep count is capped, dropping
    /// the excess rather than spiralling.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if frame_dt.is_finite() && frame_dt > 0.0 {
            self.accumulator += frame_dt.min(MAX_FRAME_DT);
        }

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS && self.accumulator >= SIM_DT {
            log::debug!("Dropping {:.3}s of simulation backlog", self.accumulator);
            self.accumulator %= SIM_DT;
        }
        substeps
    }

    /// Fraction of a tick left over, for render interpolation
    pub fn alpha(&self) -> f32 {
        self.accumulator / SIM_DT
    }
}

/// Owns the config, the match and the frame stepper
#[derive(Debug, Clone)]
pub struct Session {
    config: MatchConfig,
    state: MatchState,
    stepper: FixedTimestep,
    /// One-shot commands waiting for the next tick
    pending: TickInput,
}

impl Session {
    /// New session on the menu; the config is assumed validated
    pub fn new(config: MatchConfig) -> Self {
        let state = MatchState::new(config.win_score, config.player_radius, config.player_mass);
        Self {
            config,
            state,
            stepper: FixedTimestep::new(),
            pending: TickInput::default(),
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Read-only access to the match
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        self.state.snapshot()
    }

    /// Run exactly one fixed tick
    pub fn step(&mut self, input: &TickInput) -> TickReport {
        tick(&mut self.state, &self.config, input, SIM_DT)
    }

    /// Hold start/restart/menu from `input` until the next tick runs
    pub fn queue_commands(&mut self, input: &TickInput) {
        self.pending.start |= input.start;
        self.pending.restart |= input.restart;
        self.pending.menu |= input.menu;
    }

    /// Feed one rendered frame, running as many ticks as it covers
    ///
    /// One-shot commands in `input` join the queue and apply on the first
    /// tick that runs, which may be in a later frame.
    pub fn frame(&mut self, frame_dt: f32, input: &TickInput) -> Vec<TickReport> {
        self.queue_commands(input);
        let steps = self.stepper.advance(frame_dt);
        let mut reports = Vec::with_capacity(steps as usize);
        for _ in 0..steps {
            let commands = std::mem::take(&mut self.pending);
            let input = TickInput {
                players: input.players,
                ..commands
            };
            reports.push(self.step(&input));
        }
        reports
    }

    pub fn start_game(&mut self) {
        self.state.start_game();
    }

    pub fn reset_game(&mut self) {
        self.state.reset_game();
    }

    pub fn show_menu(&mut self) {
        self.state.show_menu();
    }

    pub fn interpolation_alpha(&self) -> f32 {
        self.stepper.alpha()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{GamePhase, MoveKeys};

    #[test]
    fn test_fixed_timestep_accumulates() {
        let mut stepper = FixedTimestep::new();
        // Half a tick: nothing yet
        assert_eq!(stepper.advance(SIM_DT * 0.5), 0);
        // The other half completes it
        assert_eq!(stepper.advance(SIM_DT * 0.6), 1);
        assert!(stepper.alpha() < 0.2);
    }

    #[test]
    fn test_fixed_timestep_caps_substeps() {
        let mut stepper = FixedTimestep::new();
        assert_eq!(stepper.advance(10.0), MAX_SUBSTEPS);
        assert!(stepper.alpha() < 1.0);
        assert_eq!(stepper.advance(f32::NAN), 0);
        assert_eq!(stepper.advance(-1.0), 0);
    }

    #[test]
    fn test_frame_applies_commands_once() {
        let mut session = Session::new(MatchConfig::default());
        let input = TickInput {
            start: true,
            players: [
                MoveKeys {
                    right: true,
                    ..Default::default()
                },
                MoveKeys::default(),
            ],
            ..Default::default()
        };

        // 60 fps frame covers two 120 Hz ticks
        let reports = session.frame(1.0 / 60.0 + 1e-4, &input);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].phase_changed, Some(GamePhase::Playing));
        assert_eq!(reports[1].phase_changed, None);
        assert!(session.snapshot().players[0].velocity.x > 0.0);
    }

    #[test]
    fn test_command_survives_frame_without_ticks() {
        let mut session = Session::new(MatchConfig::default());
        let start = TickInput {
            start: true,
            ..Default::default()
        };

        // Too short to run a tick: the start waits in the queue
        assert!(session.frame(SIM_DT * 0.25, &start).is_empty());
        assert_eq!(session.snapshot().phase, GamePhase::Menu);

        let reports = session.frame(SIM_DT, &TickInput::default());
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].phase_changed, Some(GamePhase::Playing));
    }

    #[test]
    fn test_queued_commands_go_through_tick() {
        let mut session = Session::new(MatchConfig::default());
        session.queue_commands(&TickInput {
            start: true,
            ..Default::default()
        });
        let reports = session.frame(SIM_DT * 1.01, &TickInput::default());
        assert_eq!(reports[0].phase_changed, Some(GamePhase::Playing));

        session.queue_commands(&TickInput {
            restart: true,
            ..Default::default()
        });
        let reports = session.frame(SIM_DT * 1.01, &TickInput::default());
        assert_eq!(reports[0].phase_changed, Some(GamePhase::Playing));

        session.queue_commands(&TickInput {
            menu: true,
            ..Default::default()
        });
        let reports = session.frame(SIM_DT * 1.01, &TickInput::default());
        assert_eq!(reports[0].phase_changed, Some(GamePhase::Menu));

        // Consumed: nothing left for the following tick
        let reports = session.frame(SIM_DT * 1.01, &TickInput::default());
        assert!(reports.iter().all(|r| r.phase_changed.is_none()));
    }

    #[test]
    fn test_clock_tracks_wall_time() {
        let mut slow = Session::new(MatchConfig::default());
        let mut fast = Session::new(MatchConfig::default());
        slow.start_game();
        fast.start_game();

        // One second at 30 fps vs 144 fps
        for _ in 0..30 {
            slow.frame(1.0 / 30.0, &TickInput::default());
        }
        for _ in 0..144 {
            fast.frame(1.0 / 144.0, &TickInput::default());
        }

        for session in [&slow, &fast] {
            let clock = session.state().clock;
            assert!((clock - 1.0).abs() <= SIM_DT * 1.01, "clock {clock}");
        }
    }
}
