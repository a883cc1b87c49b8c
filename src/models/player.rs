//! Player, GameResult and PlayerStats data structures.

use serde::{Deserialize, Serialize};

/// How many results `PlayerStats::last_ten_games` keeps.
pub const RECENT_GAMES: usize = 10;

/// A seat at the table. Names are unique within a game (case-insensitive).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub score: i64,
}

impl Player {
    /// Create a new player with the given name and a zero score.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: 0,
        }
    }

    /// Add (or subtract) points.
    pub fn add_score(&mut self, points: i64) {
        self.score += points;
    }
}

/// One scored measurement, as stored in a player's history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub score: i64,
    pub deviation: f64,
    pub target_weight: u32,
    pub actual_weight: f64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub is_perfect: bool,
}

impl GameResult {
    /// A result counts as a win when it scored above zero.
    pub fn is_win(&self) -> bool {
        self.score > 0
    }
}

/// Persisted aggregate statistics for one player name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub name: String,
    pub games: u32,
    pub perfect_drinks: u32,
    pub total_score: i64,
    pub average_score: f64,
    pub best_score: i64,
    pub worst_score: i64,
    pub average_deviation: f64,
    /// Most recent first.
    pub last_ten_games: Vec<GameResult>,
    /// Percentage (0..=100) of wins among `last_ten_games`.
    pub win_rate: f64,
    pub longest_win_streak: u32,
    pub current_win_streak: u32,
}

impl PlayerStats {
    /// Fresh record seeded from a first result.
    pub fn from_first_result(name: impl Into<String>, result: GameResult) -> Self {
        let win = result.is_win();
        Self {
            name: name.into(),
            games: 1,
            perfect_drinks: u32::from(result.is_perfect),
            total_score: result.score,
            average_score: result.score as f64,
            best_score: result.score,
            worst_score: result.score,
            average_deviation: result.deviation,
            win_rate: if win { 100.0 } else { 0.0 },
            longest_win_streak: u32::from(win),
            current_win_streak: u32::from(win),
            last_ten_games: vec![result],
        }
    }

    /// Timestamp of the most recent recorded result, 0 when there is none.
    pub fn last_played(&self) -> i64 {
        self.last_ten_games.first().map_or(0, |g| g.timestamp)
    }
}
