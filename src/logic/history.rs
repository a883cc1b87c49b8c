//! Game history derived from each player's recent results.

use crate::models::{CompleteGameHistory, PlayerGameResult, PlayerStats};
use chrono::{NaiveDate, TimeZone};
use std::collections::HashMap;

const HOUR_MS: i64 = 3_600_000;

/// Group every player's recent results into games, one per clock hour, newest first.
///
/// A player appears at most once per game with the first result seen for that hour
/// (`last_ten_games` is newest first). The winner is the highest score; ties keep the
/// player listed first.
pub fn group_games_by_hour(stats: &[PlayerStats]) -> Vec<CompleteGameHistory> {
    let mut games: Vec<CompleteGameHistory> = Vec::new();
    let mut by_hour: HashMap<i64, usize> = HashMap::new();

    for player in stats {
        for result in &player.last_ten_games {
            let hour = result.timestamp.div_euclid(HOUR_MS) * HOUR_MS;
            let idx = *by_hour.entry(hour).or_insert_with(|| {
                games.push(CompleteGameHistory {
                    id: hour.to_string(),
                    timestamp: result.timestamp,
                    players: Vec::new(),
                    winner: String::new(),
                    total_perfect_drinks: 0,
                });
                games.len() - 1
            });
            let game = &mut games[idx];
            if game.players.iter().any(|p| p.player_name == player.name) {
                continue;
            }
            game.players.push(PlayerGameResult {
                player_name: player.name.clone(),
                score: result.score,
                perfect_drinks: u32::from(result.is_perfect),
                attempts: 1,
            });
            if result.is_perfect {
                game.total_perfect_drinks += 1;
            }
        }
    }

    for game in &mut games {
        let mut best: Option<&PlayerGameResult> = None;
        for p in &game.players {
            if best.map_or(true, |b| p.score > b.score) {
                best = Some(p);
            }
        }
        game.winner = best.map(|p| p.player_name.clone()).unwrap_or_default();
    }

    // Stable, so games with equal timestamps keep first-seen order.
    games.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    games
}

/// Calendar day of a game in `tz`.
pub fn game_date<Tz: TimeZone>(game: &CompleteGameHistory, tz: &Tz) -> Option<NaiveDate> {
    tz.timestamp_millis_opt(game.timestamp)
        .earliest()
        .map(|t| t.date_naive())
}

/// Distinct days that have games, in the order the games are listed.
pub fn game_dates<Tz: TimeZone>(games: &[CompleteGameHistory], tz: &Tz) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    for date in games.iter().filter_map(|g| game_date(g, tz)) {
        if !dates.contains(&date) {
            dates.push(date);
        }
    }
    dates
}

/// Games played on `date`, or all of them when no date is selected.
pub fn games_on<'a, Tz: TimeZone>(
    games: &'a [CompleteGameHistory],
    date: Option<NaiveDate>,
    tz: &Tz,
) -> Vec<&'a CompleteGameHistory> {
    games
        .iter()
        .filter(|g| date.map_or(true, |d| game_date(g, tz) == Some(d)))
        .collect()
}
