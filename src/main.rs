//! Cursor Clash entry point
//!
//! The browser build drives the simulation through `cursor_clash::wasm`.
//! Natively this runs a headless match between two seeded bots and logs
//! how it went.
//!
//! Usage: `cursor-clash [config.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use cursor_clash::consts::*;
    use cursor_clash::ground_xz;
    use cursor_clash::sim::{GamePhase, MatchSnapshot, MoveKeys, PlayerId, Session, TickInput};
    use cursor_clash::{Achievements, MatchConfig, MatchRecorder, TournamentStats};

    /// Longest match the demo will simulate (seconds)
    const MATCH_TIME_LIMIT: f32 = 180.0;

    /// Chases the opponent with some noise so matches don't repeat
    struct Bot {
        player: PlayerId,
        rng: Pcg32,
        /// Ticks left on the current random heading
        wander_ticks: u32,
        wander: Vec2,
    }

    impl Bot {
        fn new(player: PlayerId, seed: u64) -> Self {
            Self {
                player,
                rng: Pcg32::seed_from_u64(seed ^ player.number() as u64),
                wander_ticks: 0,
                wander: Vec2::ZERO,
            }
        }

        fn keys(&mut self, snapshot: &MatchSnapshot) -> MoveKeys {
            let me = ground_xz(snapshot.player(self.player).position);
            let them = ground_xz(snapshot.player(self.player.opponent()).position);

            if self.wander_ticks == 0 && self.rng.random::<f32>() < 0.01 {
                self.wander_ticks = self.rng.random_range(20..90);
                let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
                self.wander = Vec2::from_angle(angle);
            }

            let heading = if self.wander_ticks > 0 {
                self.wander_ticks -= 1;
                self.wander
            } else {
                (them - me).normalize_or_zero()
            };

            // Dead zone keeps bots from jittering on one axis
            MoveKeys {
                left: heading.x < -0.3,
                right: heading.x > 0.3,
                forward: heading.y < -0.3,
                backward: heading.y > 0.3,
            }
        }
    }

    pub fn run() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        log::info!("Cursor Clash (headless) starting...");

        let mut args = std::env::args().skip(1);
        let config = match args.next() {
            Some(path) => match MatchConfig::load(&path) {
                Ok(config) => config,
                Err(e) => {
                    log::error!("Could not load {}: {}", path, e);
                    std::process::exit(1);
                }
            },
            None => MatchConfig::default(),
        };
        let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(0xC1A5_u64);
        log::info!("Match seed: {}", seed);

        let mut session = Session::new(config);
        let mut bots = [Bot::new(PlayerId::One, seed), Bot::new(PlayerId::Two, seed)];
        let mut recorder = MatchRecorder::new(PlayerId::One);

        session.start_game();
        while session.state().phase == GamePhase::Playing
            && session.state().clock < MATCH_TIME_LIMIT
        {
            let snapshot = session.snapshot();
            let input = TickInput {
                players: [bots[0].keys(&snapshot), bots[1].keys(&snapshot)],
                ..Default::default()
            };

            let report = session.step(&input);
            if let Some(collision) = &report.collision {
                log::info!(
                    "t={:.2}s clash (speeds {:.2} vs {:.2}) -> {}",
                    session.state().clock,
                    collision.speeds_before[0],
                    collision.speeds_before[1],
                    collision
                        .scorer
                        .map_or_else(|| "no point".to_string(), |p| format!("point to {p}")),
                );
            }
            recorder.observe(&report, &session.snapshot());
        }

        let snapshot = session.snapshot();
        match snapshot.winner {
            Some(winner) => log::info!(
                "{} wins {}-{} after {:.1}s ({} ticks at {:.0} Hz)",
                winner,
                snapshot.scores[winner.index()],
                snapshot.scores[winner.opponent().index()],
                snapshot.clock,
                (snapshot.clock / SIM_DT).round(),
                1.0 / SIM_DT
            ),
            None => log::warn!(
                "No winner after {:.0}s, score {}-{}",
                snapshot.clock,
                snapshot.scores[0],
                snapshot.scores[1]
            ),
        }

        let mut stats = TournamentStats::default();
        recorder.finish(&snapshot, &mut stats);
        let mut achievements = Achievements::new();
        let unlocked = achievements.check(&stats, 0.0);
        log::info!(
            "{}: {} hits, {} dodges, rank {}, {} achievement(s) unlocked",
            PlayerId::One,
            stats.total_hits,
            stats.total_dodges,
            stats.rank(),
            unlocked.len()
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is ClashSession, this is just to satisfy the compiler
}
