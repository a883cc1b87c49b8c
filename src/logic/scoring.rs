//! Scoring: points for a pour, the win predicate and duel resolution.

use crate::models::{DuelPayout, DuelState, RoundRules};
use serde::{Deserialize, Serialize};

/// Points for a single measurement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundScore {
    pub score: i64,
    pub is_perfect: bool,
    pub deviation: f64,
}

/// Score a measurement against the target.
///
/// Exact hit: `perfect_score`. Within margin: `perfect_score - deviation * margin_penalty`.
/// Outside margin: `-deviation * failure_penalty`. Both non-perfect branches are floored at
/// `min_score`, so the result never drops below it.
pub fn calculate_score(measured: f64, target: f64, rules: &RoundRules) -> RoundScore {
    let scoring = &rules.scoring;
    let deviation = (measured - target).abs();
    if deviation == 0.0 {
        return RoundScore {
            score: scoring.perfect_score,
            is_perfect: true,
            deviation,
        };
    }
    let raw = if deviation <= rules.margin {
        scoring.perfect_score as f64 - deviation * scoring.margin_penalty as f64
    } else {
        -deviation * scoring.failure_penalty as f64
    };
    RoundScore {
        score: (raw.round() as i64).max(scoring.min_score),
        is_perfect: false,
        deviation,
    }
}

/// Whether a pour is close enough to count as a win (inclusive at exactly `margin`).
pub fn is_valid_weight(measured: f64, target: f64, margin: f64) -> bool {
    (measured - target).abs() <= margin
}

/// Outcome of a finished duel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuelOutcome {
    pub winner: String,
    pub loser: String,
    pub winner_deviation: f64,
    pub loser_deviation: f64,
    pub payout: DuelPayout,
}

/// Resolve a duel once both weights are in; `None` while a side is still to pour.
/// Lower deviation wins and the challenger keeps ties.
pub fn resolve_duel(duel: &DuelState, target: f64, payout: DuelPayout) -> Option<DuelOutcome> {
    let challenger_dev = (duel.challenger_weight? - target).abs();
    let opponent_dev = (duel.opponent_weight? - target).abs();
    let outcome = if challenger_dev <= opponent_dev {
        DuelOutcome {
            winner: duel.challenger.clone(),
            loser: duel.opponent.clone(),
            winner_deviation: challenger_dev,
            loser_deviation: opponent_dev,
            payout,
        }
    } else {
        DuelOutcome {
            winner: duel.opponent.clone(),
            loser: duel.challenger.clone(),
            winner_deviation: opponent_dev,
            loser_deviation: challenger_dev,
            payout,
        }
    };
    Some(outcome)
}
