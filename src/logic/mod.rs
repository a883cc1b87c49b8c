//! Game business logic: dice, turns, scoring, measuring, statistics and history.

mod dice;
mod history;
mod round;
mod scoring;
mod stats;
mod turns;

pub use dice::{RandomSource, RngSource, ScriptedSource};
pub use history::{game_date, game_dates, games_on, group_games_by_hour};
pub use round::{normalize_reading, record_measurement, PourOutcome, PourReport, RoundError};
pub use scoring::{calculate_score, is_valid_weight, resolve_duel, DuelOutcome, RoundScore};
pub use stats::{merge_player_stats, merge_settings, update_player_stats};
pub use turns::{move_to_next_player, next_phase, roll_dice, start_game, update_duel_weight};
