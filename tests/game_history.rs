//! Game history rebuilt from player statistics: hourly grouping, winners, day filters.

use chrono::{FixedOffset, NaiveDate, Utc};
use pour_party::logic::{game_dates, games_on};
use pour_party::{group_games_by_hour, update_player_stats, GameResult, PlayerStats};

const HOUR: i64 = 3_600_000;
/// 2024-03-01T00:00:00Z
const DAY_ONE: i64 = 1_709_251_200_000;

fn result(score: i64, timestamp: i64, is_perfect: bool) -> GameResult {
    GameResult {
        score,
        deviation: if is_perfect { 0.0 } else { 3.0 },
        target_weight: 42,
        actual_weight: 45.0,
        timestamp,
        is_perfect,
    }
}

/// Stats built the way the game records them, oldest result first.
fn stats(players: &[(&str, Vec<GameResult>)]) -> Vec<PlayerStats> {
    let mut all = Vec::new();
    for (name, results) in players {
        for r in results.iter() {
            update_player_stats(&mut all, name, r.clone());
        }
    }
    all
}

#[test]
fn results_in_the_same_hour_form_one_game() {
    let all = stats(&[
        ("Alice", vec![result(900, DAY_ONE + 60_000, true)]),
        ("Bob", vec![result(400, DAY_ONE + 20 * 60_000, false)]),
        ("Cara", vec![result(-500, DAY_ONE + HOUR + 1, false)]),
    ]);
    let games = group_games_by_hour(&all);
    assert_eq!(games.len(), 2);

    // Newest first.
    assert_eq!(games[0].id, (DAY_ONE + HOUR).to_string());
    assert_eq!(games[0].winner, "Cara");

    let first = &games[1];
    assert_eq!(first.id, DAY_ONE.to_string());
    assert_eq!(first.timestamp, DAY_ONE + 60_000);
    let names: Vec<&str> = first.players.iter().map(|p| p.player_name.as_str()).collect();
    assert_eq!(names, ["Alice", "Bob"]);
    assert_eq!(first.winner, "Alice");
    assert_eq!(first.total_perfect_drinks, 1);
    assert_eq!(first.players[0].perfect_drinks, 1);
    assert_eq!(first.players[1].attempts, 1);
}

#[test]
fn a_player_counts_once_per_game_with_the_latest_result() {
    let all = stats(&[(
        "Alice",
        vec![result(-1000, DAY_ONE + 1, true), result(700, DAY_ONE + 2, false)],
    )]);
    let games = group_games_by_hour(&all);
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].players.len(), 1);
    assert_eq!(games[0].players[0].score, 700);
    // The skipped perfect pour is not counted either.
    assert_eq!(games[0].total_perfect_drinks, 0);
}

#[test]
fn tied_top_score_goes_to_the_first_player_listed() {
    let all = stats(&[
        ("Alice", vec![result(500, DAY_ONE, false)]),
        ("Bob", vec![result(500, DAY_ONE + 5, false)]),
    ]);
    assert_eq!(group_games_by_hour(&all)[0].winner, "Alice");
}

#[test]
fn no_stats_no_games() {
    assert!(group_games_by_hour(&[]).is_empty());
}

#[test]
fn games_filter_by_calendar_day() {
    let all = stats(&[
        ("Alice", vec![result(100, DAY_ONE + 2 * HOUR, false)]),
        ("Bob", vec![result(200, DAY_ONE + 23 * HOUR, false)]),
        ("Cara", vec![result(300, DAY_ONE + 26 * HOUR, false)]),
    ]);
    let games = group_games_by_hour(&all);
    let day_one = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let day_two = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();

    assert_eq!(game_dates(&games, &Utc), [day_two, day_one]);
    assert_eq!(games_on(&games, None, &Utc).len(), 3);
    let first_day: Vec<&str> = games_on(&games, Some(day_one), &Utc)
        .iter()
        .map(|g| g.winner.as_str())
        .collect();
    assert_eq!(first_day, ["Bob", "Alice"]);

    // Two hours ahead of UTC, the 23:00 game falls on the next day.
    let east = FixedOffset::east_opt(2 * 3600).unwrap();
    assert_eq!(games_on(&games, Some(day_two), &east).len(), 2);
}
