//! Pour party: dice-and-scale pouring game. Game core, session server and clients, persistence.

pub mod api;
pub mod config;
pub mod logic;
pub mod models;
pub mod persistence;
pub mod scale;
pub mod session;

pub use config::{ClientConfig, ServerConfig};
pub use logic::{
    calculate_score, group_games_by_hour, is_valid_weight, merge_player_stats, merge_settings,
    move_to_next_player, next_phase, record_measurement, roll_dice, start_game, update_duel_weight,
    update_player_stats, PourOutcome, PourReport, RandomSource, RoundError,
};
pub use models::{
    CompleteGameHistory, DuelState, GamePhase, GameResult, GameSettings, GameState, Player,
    PlayerStats, RoundRules, ScoringConfig, Session, SessionError, SessionId,
};
pub use persistence::{GameData, LocalStore, StorageError, SyncManager, SyncResult};
pub use scale::{PourStation, Scale, ScaleError};
pub use session::{HostSession, SessionApi, SessionStore};
