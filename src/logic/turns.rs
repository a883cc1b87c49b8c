//! Turn progression: start, roll, phase changes, advancing players and duel turns.

use crate::logic::dice::RandomSource;
use crate::models::{DuelState, DuelTurn, GameError, GamePhase, GameState};

/// Leave Setup and start rolling. Requires at least one player.
pub fn start_game(state: &mut GameState) -> Result<(), GameError> {
    if state.phase != GamePhase::Setup {
        return Err(GameError::InvalidPhase(state.phase));
    }
    if state.players.is_empty() {
        return Err(GameError::NoPlayers);
    }
    state.current_player_index = 0;
    reset_round(state);
    Ok(())
}

/// Roll both dice for the current player (Rolling only).
///
/// Dice are sorted high-first and the target is the two digits read as a number
/// (4 and 6 give 64). A double with at least one other player opens a duel against a
/// randomly picked opponent and allows a single attempt; otherwise it is a normal round.
pub fn roll_dice(state: &mut GameState, rng: &mut dyn RandomSource) -> Result<(), GameError> {
    if state.phase != GamePhase::Rolling {
        return Err(GameError::InvalidPhase(state.phase));
    }
    let first = rng.roll_die();
    let second = rng.roll_die();
    let (dice1, dice2) = if first >= second { (first, second) } else { (second, first) };

    state.dice1 = dice1;
    state.dice2 = dice2;
    state.target_weight = u32::from(dice1) * 10 + u32::from(dice2);
    state.phase = GamePhase::Drinking;
    state.attempts = 0;
    state.duel = None;

    if dice1 == dice2 && state.players.len() > 1 {
        let challenger_idx = state.current_player_index;
        let opponents: Vec<usize> = (0..state.players.len()).filter(|&i| i != challenger_idx).collect();
        let opponent_idx = opponents[rng.pick_index(opponents.len())];
        let challenger = state.players[challenger_idx].name.clone();
        let opponent = state.players[opponent_idx].name.clone();
        log::debug!("Double {}: {} duels {}", dice1, challenger, opponent);
        state.duel = Some(DuelState::new(challenger, opponent));
        state.max_attempts = 1;
    }
    Ok(())
}

/// Drinking moves on to Measuring; every other phase goes back to Rolling.
pub fn next_phase(state: &mut GameState) {
    state.phase = match state.phase {
        GamePhase::Drinking => GamePhase::Measuring,
        _ => GamePhase::Rolling,
    };
}

/// Hand the turn on.
///
/// - Duel, challenger just poured: the opponent pours next (no rotation).
/// - Duel, opponent just poured: duel closes, next is the player after the challenger.
/// - Otherwise: the next player in rotation.
///
/// Except for the first case the round resets to Rolling with cleared dice and attempts.
pub fn move_to_next_player(state: &mut GameState) {
    let n = state.players.len();
    let duel_turn = state
        .duel
        .as_ref()
        .filter(|d| d.is_active)
        .map(|d| (d.current_turn, d.challenger.clone(), d.opponent.clone()));

    match duel_turn {
        Some((DuelTurn::Challenger, _, opponent)) => {
            if let Some(idx) = state.player_index(&opponent) {
                state.current_player_index = idx;
            }
            if let Some(duel) = state.duel.as_mut() {
                duel.current_turn = DuelTurn::Opponent;
            }
            state.phase = GamePhase::Drinking;
            state.attempts = 0;
        }
        Some((DuelTurn::Opponent, challenger, _)) => {
            let challenger_idx = state.player_index(&challenger).unwrap_or(state.current_player_index);
            state.current_player_index = if n == 0 { 0 } else { (challenger_idx + 1) % n };
            reset_round(state);
        }
        None => {
            state.current_player_index = if n == 0 { 0 } else { (state.current_player_index + 1) % n };
            reset_round(state);
        }
    }
}

/// Record a duel pour for the side whose turn it is. Each side pours exactly once.
pub fn update_duel_weight(state: &mut GameState, weight: f64) -> Result<(), GameError> {
    let duel = state
        .duel
        .as_mut()
        .filter(|d| d.is_active)
        .ok_or(GameError::NoActiveDuel)?;
    let slot = match duel.current_turn {
        DuelTurn::Challenger => &mut duel.challenger_weight,
        DuelTurn::Opponent => &mut duel.opponent_weight,
    };
    if slot.is_some() {
        return Err(GameError::DuelWeightAlreadyRecorded);
    }
    *slot = Some(weight);
    Ok(())
}

/// Back to Rolling with no dice, no attempts and no duel.
fn reset_round(state: &mut GameState) {
    state.phase = GamePhase::Rolling;
    state.dice1 = 0;
    state.dice2 = 0;
    state.target_weight = 0;
    state.attempts = 0;
    state.duel = None;
    if state.default_max_attempts > 0 {
        state.max_attempts = state.default_max_attempts;
    }
}
