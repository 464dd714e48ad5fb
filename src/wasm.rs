//! Browser bindings
//!
//! The JS side owns rendering, audio and key handling. Each animation frame
//! it calls `tick` with the elapsed time and a key bitmask (see
//! [`TickInput::from_bits`]), then reads back JSON snapshots and reports.
//! `start`, `restart` and `menu` queue the same commands as bits 8-10.

use wasm_bindgen::prelude::*;

use crate::achievements::{Achievements, MatchRecorder, TournamentStats};
use crate::config::MatchConfig;
use crate::sim::{GamePhase, PlayerId, Session, TickInput, TickReport};

#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    // A second init (hot reload) is harmless
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Cursor Clash starting...");
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// A match session driven from JS
#[wasm_bindgen]
pub struct ClashSession {
    session: Session,
    recorder: MatchRecorder,
    stats: TournamentStats,
    achievements: Achievements,
    last_reports: Vec<TickReport>,
}

#[wasm_bindgen]
impl ClashSession {
    /// Create a session; pass an empty string for the default config
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<ClashSession, JsValue> {
        let config = if config_json.trim().is_empty() {
            MatchConfig::default()
        } else {
            MatchConfig::from_json(config_json).map_err(to_js_error)?
        };

        Ok(Self {
            session: Session::new(config),
            recorder: MatchRecorder::new(PlayerId::One),
            stats: TournamentStats::default(),
            achievements: Achievements::new(),
            last_reports: Vec::new(),
        })
    }

    /// Load previously saved stats and achievements
    pub fn restore_progress(
        &mut self,
        stats_json: &str,
        achievements_json: &str,
    ) -> Result<(), JsValue> {
        self.stats = serde_json::from_str(stats_json).map_err(to_js_error)?;
        self.achievements = serde_json::from_str(achievements_json).map_err(to_js_error)?;
        Ok(())
    }

    /// Advance by one rendered frame; returns the number of ticks run
    pub fn tick(&mut self, frame_dt: f32, keys: u16) -> u32 {
        let input = TickInput::from_bits(keys);
        self.last_reports = self.session.frame(frame_dt, &input);

        let snapshot = self.session.snapshot();
        for report in &self.last_reports {
            match report.phase_changed {
                Some(GamePhase::Playing) | Some(GamePhase::Menu) => {
                    self.recorder = MatchRecorder::new(PlayerId::One);
                }
                _ => {}
            }
            self.recorder.observe(report, &snapshot);
            if report.phase_changed == Some(GamePhase::Ended) {
                self.recorder.finish(&snapshot, &mut self.stats);
                self.achievements.check(&self.stats, now_ms());
            }
        }
        self.last_reports.len() as u32
    }

    /// Start a match on the next tick
    pub fn start(&mut self) {
        self.queue(TickInput {
            start: true,
            ..Default::default()
        });
    }

    /// Restart the current match on the next tick
    pub fn restart(&mut self) {
        self.queue(TickInput {
            restart: true,
            ..Default::default()
        });
    }

    /// Return to the menu on the next tick
    pub fn menu(&mut self) {
        self.queue(TickInput {
            menu: true,
            ..Default::default()
        });
    }

    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.snapshot()).map_err(to_js_error)
    }

    /// Reports produced by the last `frame` call
    pub fn reports_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.last_reports).map_err(to_js_error)
    }

    pub fn stats_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.stats).map_err(to_js_error)
    }

    pub fn achievements_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.achievements).map_err(to_js_error)
    }

    pub fn rank(&self) -> String {
        self.stats.rank().to_string()
    }

    pub fn mark_achievement_seen(&mut self, id: &str) {
        self.achievements.mark_seen(id);
    }

    pub fn interpolation_alpha(&self) -> f32 {
        self.session.interpolation_alpha()
    }
}

impl ClashSession {
    fn queue(&mut self, commands: TickInput) {
        self.session.queue_commands(&commands);
    }
}

#[wasm_bindgen(inline_js = "export function now_ms() { return Date.now(); }")]
extern "C" {
    fn now_ms() -> f64;
}
