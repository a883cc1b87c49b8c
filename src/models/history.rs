//! Past games reconstructed from player statistics.

use serde::{Deserialize, Serialize};

/// One player's part in a reconstructed game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerGameResult {
    pub player_name: String,
    pub score: i64,
    pub perfect_drinks: u32,
    pub attempts: u32,
}

/// Results played within the same clock hour, grouped as one game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteGameHistory {
    /// Start of the hour in milliseconds since the epoch, as a string.
    pub id: String,
    /// Timestamp of the first result seen for this hour.
    pub timestamp: i64,
    pub players: Vec<PlayerGameResult>,
    pub winner: String,
    pub total_perfect_drinks: u32,
}
