//! Data structures for the pouring game: players, game state, presets, sessions.

mod game;
mod history;
mod player;
mod session;
mod settings;

pub use game::{DuelState, DuelTurn, GameError, GamePhase, GameState};
pub use history::{CompleteGameHistory, PlayerGameResult};
pub use player::{GameResult, Player, PlayerStats, RECENT_GAMES};
pub use session::{
    CreateSessionRequest, CreatedSession, EndSessionRequest, OwnerToken, Session, SessionError,
    SessionId, SessionUpdate,
};
pub use settings::{
    default_presets, DuelPayout, GameSettingPreset, GameSettings, RoundRules, ScoringConfig,
};
