//! Player statistics: incremental updates and last-write-wins reconciliation.

use crate::models::{GameResult, PlayerStats, RECENT_GAMES};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Fold one result into the named player's record, creating it on first sight.
///
/// Not idempotent: callers must record each measurement at most once.
pub fn update_player_stats(all_stats: &mut Vec<PlayerStats>, name: &str, result: GameResult) {
    let Some(stats) = all_stats.iter_mut().find(|s| s.name == name) else {
        all_stats.push(PlayerStats::from_first_result(name, result));
        return;
    };

    stats.games += 1;
    stats.total_score += result.score;
    stats.average_score = stats.total_score as f64 / f64::from(stats.games);
    if result.is_perfect {
        stats.perfect_drinks += 1;
    }
    stats.best_score = stats.best_score.max(result.score);
    stats.worst_score = stats.worst_score.min(result.score);

    let total_deviation = stats.average_deviation * f64::from(stats.games - 1) + result.deviation;
    stats.average_deviation = total_deviation / f64::from(stats.games);

    if result.is_win() {
        stats.current_win_streak += 1;
        stats.longest_win_streak = stats.longest_win_streak.max(stats.current_win_streak);
    } else {
        stats.current_win_streak = 0;
    }

    stats.last_ten_games.insert(0, result);
    stats.last_ten_games.truncate(RECENT_GAMES);

    let wins = stats.last_ten_games.iter().filter(|g| g.is_win()).count();
    stats.win_rate = wins as f64 / stats.last_ten_games.len() as f64 * 100.0;
}

/// Merge two stat lists, one whole record per player name.
///
/// The side with the more recent `last_ten_games[0].timestamp` wins; ties keep local.
/// Server order is kept, players only known locally are appended.
pub fn merge_player_stats(local: &[PlayerStats], server: &[PlayerStats]) -> Vec<PlayerStats> {
    let mut merged: Vec<PlayerStats> = server.to_vec();
    let positions: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, s)| (s.name.clone(), i))
        .collect();

    for stat in local {
        match positions.get(&stat.name) {
            Some(&i) => {
                if stat.last_played() >= merged[i].last_played() {
                    merged[i] = stat.clone();
                }
            }
            None => merged.push(stat.clone()),
        }
    }
    merged
}

/// Shallow-merge two settings documents with local precedence.
///
/// Object-valued fields present on both sides (e.g. `scoring`) are merged key by key, again
/// preferring local. Anything that is not an object on both sides is taken from local
/// when present.
pub fn merge_settings(local: &Value, server: &Value) -> Value {
    match (local, server) {
        (Value::Object(l), Value::Object(s)) => {
            let mut out: Map<String, Value> = s.clone();
            for (key, lv) in l {
                let value = match (lv, s.get(key)) {
                    (Value::Object(lo), Some(Value::Object(so))) => {
                        let mut nested = so.clone();
                        nested.extend(lo.iter().map(|(k, v)| (k.clone(), v.clone())));
                        Value::Object(nested)
                    }
                    _ => lv.clone(),
                };
                out.insert(key.clone(), value);
            }
            Value::Object(out)
        }
        (Value::Null, s) => s.clone(),
        (l, _) => l.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn settings_merge_prefers_local_and_merges_scoring() {
        let local = json!({ "margin": 3, "scoring": { "perfectScore": 2000 } });
        let server = json!({
            "margin": 5,
            "maxRetries": 2,
            "scoring": { "perfectScore": 1000, "minScore": -500 }
        });
        let merged = merge_settings(&local, &server);
        assert_eq!(
            merged,
            json!({
                "margin": 3,
                "maxRetries": 2,
                "scoring": { "perfectScore": 2000, "minScore": -500 }
            })
        );
    }

    #[test]
    fn settings_merge_with_missing_local_takes_server() {
        let server = json!({ "activePresetId": "expert" });
        assert_eq!(merge_settings(&Value::Null, &server), server);
    }
}
