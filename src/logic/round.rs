//! Measuring step of a round: turn a scale reading into score, attempts and turn changes.

use crate::logic::scoring::{calculate_score, is_valid_weight, resolve_duel, DuelOutcome, RoundScore};
use crate::logic::turns::{move_to_next_player, update_duel_weight};
use crate::models::{DuelTurn, GameError, GamePhase, GameResult, GameState, RoundRules};
use serde::{Deserialize, Serialize};

/// Errors from recording a measurement.
#[derive(Clone, Debug, PartialEq)]
pub enum RoundError {
    Game(GameError),
    /// Zero or unreadable weight; never scored.
    InvalidWeight(f64),
}

impl std::fmt::Display for RoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundError::Game(e) => write!(f, "{}", e),
            RoundError::InvalidWeight(w) => write!(f, "Invalid weight reading: {}g", w),
        }
    }
}

impl std::error::Error for RoundError {}

impl From<GameError> for RoundError {
    fn from(e: GameError) -> Self {
        RoundError::Game(e)
    }
}

/// What happened at the table after a pour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PourOutcome {
    /// Normal round. `turn_over` is set when the player won or ran out of attempts.
    Scored {
        player: String,
        score: RoundScore,
        is_win: bool,
        turn_over: bool,
    },
    /// Challenger poured; the opponent is up.
    DuelPending { challenger: String, weight: f64 },
    /// Opponent poured; payouts applied and play moved on.
    DuelResolved(DuelOutcome),
}

/// Outcome plus the per-player results to feed into statistics, once.
#[derive(Clone, Debug, PartialEq)]
pub struct PourReport {
    pub outcome: PourOutcome,
    pub results: Vec<(String, GameResult)>,
}

/// Scale readings come in 0.1 g steps; sign is dropped (glass lifted after tare).
pub fn normalize_reading(measured: f64) -> f64 {
    (measured.abs() * 10.0).round() / 10.0
}

fn is_usable_reading(weight: f64) -> bool {
    weight.is_finite() && weight > 0.0
}

/// Record a measured pour for the current player (Drinking or Measuring).
///
/// Normal round: score it, add the points, then advance on a win or when attempts run out.
/// A miss with attempts left sends the player back to Drinking.
/// An unusable reading is rejected without touching the state.
///
/// Duel: store the weight for the side on turn (even an unusable reading, so a duel can
/// never get stuck), hand over to the opponent, and resolve once both have poured.
pub fn record_measurement(
    state: &mut GameState,
    rules: &RoundRules,
    measured: f64,
    timestamp: i64,
) -> Result<PourReport, RoundError> {
    if !matches!(state.phase, GamePhase::Drinking | GamePhase::Measuring) {
        return Err(GameError::InvalidPhase(state.phase).into());
    }
    let player = state
        .current_player()
        .map(|p| p.name.clone())
        .ok_or(GameError::NoPlayers)?;
    let weight = if measured.is_finite() { normalize_reading(measured) } else { 0.0 };
    let target = f64::from(state.target_weight);

    if state.duel.as_ref().is_some_and(|d| d.is_active) {
        if !is_usable_reading(weight) {
            log::warn!("Recording unusable duel reading {} for {}", measured, player);
        }
        return record_duel_pour(state, rules, player, weight, timestamp);
    }

    if !is_usable_reading(weight) {
        return Err(RoundError::InvalidWeight(measured));
    }

    let score = calculate_score(weight, target, rules);
    let is_win = is_valid_weight(weight, target, state.margin);
    state.update_player_score(score.score);
    let result = GameResult {
        score: score.score,
        deviation: score.deviation,
        target_weight: state.target_weight,
        actual_weight: weight,
        timestamp,
        is_perfect: score.is_perfect,
    };

    let turn_over = if is_win {
        true
    } else {
        state.increment_attempts();
        state.attempts_exhausted()
    };
    if turn_over {
        move_to_next_player(state);
    } else {
        state.phase = GamePhase::Drinking;
    }

    Ok(PourReport {
        outcome: PourOutcome::Scored {
            player: player.clone(),
            score,
            is_win,
            turn_over,
        },
        results: vec![(player, result)],
    })
}

fn record_duel_pour(
    state: &mut GameState,
    rules: &RoundRules,
    player: String,
    weight: f64,
    timestamp: i64,
) -> Result<PourReport, RoundError> {
    update_duel_weight(state, weight)?;
    state.increment_attempts();

    let duel = state.duel.clone().ok_or(GameError::NoActiveDuel)?;
    if duel.current_turn == DuelTurn::Challenger {
        move_to_next_player(state);
        return Ok(PourReport {
            outcome: PourOutcome::DuelPending {
                challenger: player,
                weight,
            },
            results: Vec::new(),
        });
    }

    let target = f64::from(state.target_weight);
    let outcome =
        resolve_duel(&duel, target, rules.scoring.duel).ok_or(GameError::Inconsistent("duel weights incomplete"))?;
    let payouts = [
        (outcome.winner.clone(), outcome.payout.win, outcome.winner_deviation),
        (outcome.loser.clone(), outcome.payout.loss, outcome.loser_deviation),
    ];
    let mut results = Vec::with_capacity(2);
    for (name, points, deviation) in payouts {
        let idx = state
            .player_index(&name)
            .ok_or_else(|| GameError::PlayerNotFound(name.clone()))?;
        state.players[idx].add_score(points);
        let actual_weight = if name == duel.challenger {
            duel.challenger_weight.unwrap_or_default()
        } else {
            duel.opponent_weight.unwrap_or_default()
        };
        results.push((
            name,
            GameResult {
                score: points,
                deviation,
                target_weight: state.target_weight,
                actual_weight,
                timestamp,
                is_perfect: deviation == 0.0,
            },
        ));
    }
    log::info!(
        "Duel won by {} ({}g off) over {} ({}g off)",
        outcome.winner,
        outcome.winner_deviation,
        outcome.loser,
        outcome.loser_deviation
    );
    move_to_next_player(state);

    Ok(PourReport {
        outcome: PourOutcome::DuelResolved(outcome),
        results,
    })
}
