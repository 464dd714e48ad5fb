//! Tournament stats and achievements
//!
//! Stats accumulate across matches for the local player. Storage is up to
//! the embedding app; everything here is serde-serializable.

use serde::{Deserialize, Serialize};

use crate::sim::{GamePhase, MatchSnapshot, PlayerId, TickReport};

/// Lifetime stats for the tracked player
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentStats {
    pub games_played: u32,
    pub games_won: u32,
    pub total_hits: u32,
    pub total_dodges: u32,
    pub longest_win_streak: u32,
    pub current_win_streak: u32,
    /// Shortest winning match (seconds)
    pub fastest_victory: Option<f32>,
    pub most_consecutive_hits: u32,
    /// Seconds spent in matches
    pub total_play_time: f32,
    /// Won without the opponent scoring
    pub perfect_games: u32,
    /// Won after trailing 0 to (win score - 1)
    pub comeback_wins: u32,
}

impl TournamentStats {
    pub fn win_rate(&self) -> f32 {
        if self.games_played == 0 {
            0.0
        } else {
            self.games_won as f32 / self.games_played as f32
        }
    }

    /// Title earned from wins and win rate
    pub fn rank(&self) -> &'static str {
        let wins = self.games_won;
        let rate = self.win_rate();

        if wins >= 50 && rate >= 0.8 {
            "Grand Champion"
        } else if wins >= 25 && rate >= 0.7 {
            "Royal Knight"
        } else if wins >= 10 && rate >= 0.6 {
            "Tournament Knight"
        } else if wins >= 5 {
            "Squire"
        } else if wins >= 1 {
            "Apprentice"
        } else {
            "Novice"
        }
    }
}

/// Watches one match from a player's point of view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecorder {
    pub player: PlayerId,
    pub hits: u32,
    pub hits_taken: u32,
    pub dodges: u32,
    consecutive_hits: u32,
    pub best_combo: u32,
    /// Trailed 0 to (win score - 1) at some point
    pub was_behind: bool,
    pub elapsed: f32,
}

impl MatchRecorder {
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            hits: 0,
            hits_taken: 0,
            dodges: 0,
            consecutive_hits: 0,
            best_combo: 0,
            was_behind: false,
            elapsed: 0.0,
        }
    }

    /// Fold in one tick's report
    pub fn observe(&mut self, report: &TickReport, snapshot: &MatchSnapshot) {
        if snapshot.phase != GamePhase::Menu {
            self.elapsed = snapshot.clock;
        }

        if let Some(collision) = &report.collision {
            let mine = collision.speeds_before[self.player.index()];
            let theirs = collision.speeds_before[self.player.opponent().index()];
            match collision.scorer {
                Some(p) if p == self.player => {
                    self.hits += 1;
                    self.consecutive_hits += 1;
                    self.best_combo = self.best_combo.max(self.consecutive_hits);
                }
                // Opponent came in harder but got nothing for it
                None if theirs > mine => self.dodges += 1,
                _ => {}
            }
        }

        for &scorer in &report.scored {
            if scorer != self.player {
                self.hits_taken += 1;
                self.consecutive_hits = 0;
            }
        }

        let mine = snapshot.scores[self.player.index()];
        let theirs = snapshot.scores[self.player.opponent().index()];
        if mine == 0 && snapshot.win_score > 1 && theirs == snapshot.win_score - 1 {
            self.was_behind = true;
        }
    }

    /// Fold the finished match into lifetime stats
    pub fn finish(&self, snapshot: &MatchSnapshot, stats: &mut TournamentStats) {
        stats.games_played += 1;
        stats.total_hits += self.hits;
        stats.total_dodges += self.dodges;
        stats.total_play_time += self.elapsed;
        stats.most_consecutive_hits = stats.most_consecutive_hits.max(self.best_combo);

        if snapshot.winner == Some(self.player) {
            stats.games_won += 1;
            stats.current_win_streak += 1;
            stats.longest_win_streak = stats.longest_win_streak.max(stats.current_win_streak);
            stats.fastest_victory = Some(
                stats
                    .fastest_victory
                    .map_or(self.elapsed, |best| best.min(self.elapsed)),
            );
            if snapshot.scores[self.player.opponent().index()] == 0 {
                stats.perfect_games += 1;
            }
            if self.was_behind {
                stats.comeback_wins += 1;
            }
        } else {
            stats.current_win_streak = 0;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Combat,
    Skill,
    Streak,
    Special,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

/// Unlock rule for an achievement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
enum Rule {
    GamesWon(u32),
    PerfectGames(u32),
    VictoryWithin(f32),
    Dodges(u32),
    WinStreak(u32),
    ComebackWins(u32),
    ConsecutiveHits(u32),
    PlayTime(f32),
}

impl Rule {
    /// (current progress, unlocked)
    fn evaluate(self, stats: &TournamentStats) -> (f32, bool) {
        match self {
            Rule::GamesWon(n) => (stats.games_won as f32, stats.games_won >= n),
            Rule::PerfectGames(n) => (stats.perfect_games as f32, stats.perfect_games >= n),
            Rule::VictoryWithin(secs) => (0.0, stats.fastest_victory.is_some_and(|t| t <= secs)),
            Rule::Dodges(n) => (stats.total_dodges as f32, stats.total_dodges >= n),
            Rule::WinStreak(n) => (
                stats.longest_win_streak as f32,
                stats.longest_win_streak >= n,
            ),
            Rule::ComebackWins(n) => (stats.comeback_wins as f32, stats.comeback_wins >= n),
            Rule::ConsecutiveHits(n) => (
                stats.most_consecutive_hits as f32,
                stats.most_consecutive_hits >= n,
            ),
            Rule::PlayTime(secs) => (stats.total_play_time, stats.total_play_time >= secs),
        }
    }
}

/// One unlockable achievement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub tier: Tier,
    pub unlocked: bool,
    /// Unix time (ms) of the unlock
    pub unlocked_at: Option<f64>,
    /// Shown as a progress bar when set
    pub max_progress: Option<f32>,
    pub progress: f32,
    rule: Rule,
}

impl Achievement {
    fn new(
        id: &str,
        title: &str,
        description: &str,
        category: Category,
        tier: Tier,
        rule: Rule,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            category,
            tier,
            unlocked: false,
            unlocked_at: None,
            max_progress: None,
            progress: 0.0,
            rule,
        }
    }

    fn with_progress(mut self, max: f32) -> Self {
        self.max_progress = Some(max);
        self
    }
}

fn catalog() -> Vec<Achievement> {
    use Category::*;
    use Tier::*;

    vec![
        Achievement::new(
            "first_blood",
            "First Blood",
            "Win your first tournament match",
            Combat,
            Bronze,
            Rule::GamesWon(1),
        ),
        Achievement::new(
            "champion",
            "Tournament Champion",
            "Win 10 tournament matches",
            Combat,
            Gold,
            Rule::GamesWon(10),
        )
        .with_progress(10.0),
        Achievement::new(
            "royal_guard",
            "Royal Guard",
            "Win 50 tournament matches",
            Combat,
            Platinum,
            Rule::GamesWon(50),
        )
        .with_progress(50.0),
        Achievement::new(
            "perfect_knight",
            "Perfect Knight",
            "Win a match without taking damage",
            Skill,
            Silver,
            Rule::PerfectGames(1),
        ),
        Achievement::new(
            "lightning_strike",
            "Lightning Strike",
            "Win a match in under 30 seconds",
            Skill,
            Gold,
            Rule::VictoryWithin(30.0),
        ),
        Achievement::new(
            "master_dodger",
            "Master Dodger",
            "Successfully dodge 100 attacks",
            Skill,
            Silver,
            Rule::Dodges(100),
        )
        .with_progress(100.0),
        Achievement::new(
            "on_fire",
            "On Fire",
            "Win 3 matches in a row",
            Streak,
            Bronze,
            Rule::WinStreak(3),
        ),
        Achievement::new(
            "unstoppable",
            "Unstoppable",
            "Win 5 matches in a row",
            Streak,
            Silver,
            Rule::WinStreak(5),
        ),
        Achievement::new(
            "legendary",
            "Legendary",
            "Win 10 matches in a row",
            Streak,
            Gold,
            Rule::WinStreak(10),
        ),
        Achievement::new(
            "comeback_king",
            "Comeback King",
            "Win after being behind 0-4",
            Special,
            Platinum,
            Rule::ComebackWins(1),
        ),
        Achievement::new(
            "combo_master",
            "Combo Master",
            "Land 5 consecutive hits",
            Special,
            Gold,
            Rule::ConsecutiveHits(5),
        ),
        Achievement::new(
            "tournament_veteran",
            "Tournament Veteran",
            "Play for 1 hour total",
            Special,
            Silver,
            Rule::PlayTime(3600.0),
        )
        .with_progress(3600.0),
    ]
}

/// Achievement list plus the queue of unlocks not yet shown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievements {
    pub list: Vec<Achievement>,
    pub recent_unlocks: Vec<String>,
}

impl Default for Achievements {
    fn default() -> Self {
        Self::new()
    }
}

impl Achievements {
    pub fn new() -> Self {
        Self {
            list: catalog(),
            recent_unlocks: Vec::new(),
        }
    }

    /// Re-evaluate against `stats`, returning ids unlocked by this call
    pub fn check(&mut self, stats: &TournamentStats, now_ms: f64) -> Vec<String> {
        let mut unlocked = Vec::new();

        for achievement in self.list.iter_mut().filter(|a| !a.unlocked) {
            let (progress, done) = achievement.rule.evaluate(stats);
            if achievement.max_progress.is_some() {
                achievement.progress = progress;
            }
            if done {
                achievement.unlocked = true;
                achievement.unlocked_at = Some(now_ms);
                log::info!("Achievement unlocked: {}", achievement.title);
                unlocked.push(achievement.id.clone());
            }
        }

        self.recent_unlocks.extend(unlocked.iter().cloned());
        unlocked
    }

    /// Drop an unlock from the notification queue
    pub fn mark_seen(&mut self, id: &str) {
        self.recent_unlocks.retain(|a| a != id);
    }

    pub fn unlocked(&self) -> impl Iterator<Item = &Achievement> {
        self.list.iter().filter(|a| a.unlocked)
    }

    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.list.iter().find(|a| a.id == id)
    }
}
