//! GameState, GamePhase and DuelState for one table.

use crate::models::player::Player;
use crate::models::settings::RoundRules;
use serde::{Deserialize, Serialize};

/// Errors that can occur during game state transitions.
#[derive(Clone, Debug, PartialEq)]
pub enum GameError {
    /// The game is not in a phase that allows this action.
    InvalidPhase(GamePhase),
    /// The action needs at least one player.
    NoPlayers,
    /// A player with this name already exists (names are unique, case-insensitive).
    DuplicatePlayerName,
    /// Player names must not be blank.
    EmptyPlayerName,
    /// No player with this name is seated.
    PlayerNotFound(String),
    /// A duel action was requested but no duel is running.
    NoActiveDuel,
    /// The side whose turn it is already has a recorded weight.
    DuelWeightAlreadyRecorded,
    /// The state violates one of its invariants.
    Inconsistent(&'static str),
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameError::InvalidPhase(phase) => write!(f, "Action not allowed during {:?} phase", phase),
            GameError::NoPlayers => write!(f, "Need at least one player"),
            GameError::DuplicatePlayerName => write!(f, "A player with this name already exists"),
            GameError::EmptyPlayerName => write!(f, "Player name must not be empty"),
            GameError::PlayerNotFound(name) => write!(f, "Player {} not found", name),
            GameError::NoActiveDuel => write!(f, "No duel in progress"),
            GameError::DuelWeightAlreadyRecorded => write!(f, "Weight for this duel turn is already recorded"),
            GameError::Inconsistent(what) => write!(f, "Inconsistent game state: {}", what),
        }
    }
}

impl std::error::Error for GameError {}

/// Current phase of the table.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Seating players; only used by multiplayer sessions.
    #[default]
    Setup,
    Rolling,
    Drinking,
    Measuring,
}

/// Which side of a duel measures next.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuelTurn {
    Challenger,
    Opponent,
}

/// A sub-round opened by a double: challenger pours first, then the opponent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuelState {
    pub is_active: bool,
    pub challenger: String,
    pub opponent: String,
    pub challenger_weight: Option<f64>,
    pub opponent_weight: Option<f64>,
    pub current_turn: DuelTurn,
}

impl DuelState {
    pub fn new(challenger: impl Into<String>, opponent: impl Into<String>) -> Self {
        Self {
            is_active: true,
            challenger: challenger.into(),
            opponent: opponent.into(),
            challenger_weight: None,
            opponent_weight: None,
            current_turn: DuelTurn::Challenger,
        }
    }

    /// Both sides have poured.
    pub fn is_complete(&self) -> bool {
        self.challenger_weight.is_some() && self.opponent_weight.is_some()
    }
}

/// Full state of one game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub players: Vec<Player>,
    pub current_player_index: usize,
    /// 0 until rolled.
    pub dice1: u8,
    /// 0 until rolled.
    pub dice2: u8,
    /// Only meaningful outside the rolling phase.
    pub target_weight: u32,
    pub margin: f64,
    pub phase: GamePhase,
    pub attempts: u32,
    pub max_attempts: u32,
    /// Retry count to restore once a duel (which forces one attempt) closes.
    #[serde(default)]
    pub default_max_attempts: u32,
    pub duel: Option<DuelState>,
}

impl GameState {
    /// Create an empty game in Setup, taking margin and retries from the rules.
    pub fn new(rules: &RoundRules) -> Self {
        Self {
            players: Vec::new(),
            current_player_index: 0,
            dice1: 0,
            dice2: 0,
            target_weight: 0,
            margin: rules.margin,
            phase: GamePhase::Setup,
            attempts: 0,
            max_attempts: rules.max_retries,
            default_max_attempts: rules.max_retries,
            duel: None,
        }
    }

    /// Create a game with the given player names, ready to roll.
    pub fn with_players<I, S>(names: I, rules: &RoundRules) -> Result<Self, GameError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = Self::new(rules);
        for name in names {
            state.add_player(name)?;
        }
        if state.players.is_empty() {
            return Err(GameError::NoPlayers);
        }
        state.phase = GamePhase::Rolling;
        Ok(state)
    }

    /// The player whose turn it is.
    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    pub fn player_index(&self, name: &str) -> Option<usize> {
        self.players.iter().position(|p| p.name == name)
    }

    /// Add a player (Setup only). Names must be unique (case-insensitive).
    pub fn add_player(&mut self, name: impl Into<String>) -> Result<(), GameError> {
        if self.phase != GamePhase::Setup {
            return Err(GameError::InvalidPhase(self.phase));
        }
        let name = name.into();
        let name_trimmed = name.trim();
        if name_trimmed.is_empty() {
            return Err(GameError::EmptyPlayerName);
        }
        let is_duplicate = self
            .players
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(name_trimmed));
        if is_duplicate {
            return Err(GameError::DuplicatePlayerName);
        }
        self.players.push(Player::new(name_trimmed));
        Ok(())
    }

    /// Remove a player by name (Setup only; players are never removed mid-game).
    pub fn remove_player(&mut self, name: &str) -> Result<(), GameError> {
        if self.phase != GamePhase::Setup {
            return Err(GameError::InvalidPhase(self.phase));
        }
        let idx = self
            .player_index(name)
            .ok_or_else(|| GameError::PlayerNotFound(name.to_string()))?;
        self.players.remove(idx);
        if self.current_player_index >= self.players.len() {
            self.current_player_index = 0;
        }
        Ok(())
    }

    /// Replace the seated players (Setup only).
    pub fn set_players(&mut self, players: Vec<Player>) -> Result<(), GameError> {
        if self.phase != GamePhase::Setup {
            return Err(GameError::InvalidPhase(self.phase));
        }
        self.players.clear();
        self.current_player_index = 0;
        for p in players {
            self.add_player(p.name.clone())?;
            if let Some(seated) = self.players.last_mut() {
                seated.score = p.score;
            }
        }
        Ok(())
    }

    /// Apply new margin and retry count, e.g. after the active preset changes.
    /// A round in progress keeps its retry count; the new one applies from the next round.
    pub fn apply_rules(&mut self, rules: &RoundRules) {
        self.margin = rules.margin;
        self.default_max_attempts = rules.max_retries;
        if self.duel.is_none() && matches!(self.phase, GamePhase::Setup | GamePhase::Rolling) {
            self.max_attempts = rules.max_retries;
        }
    }

    pub fn increment_attempts(&mut self) {
        self.attempts += 1;
    }

    /// The current player ran out of attempts for this target.
    pub fn attempts_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Add points to the current player.
    pub fn update_player_score(&mut self, points: i64) {
        if let Some(p) = self.players.get_mut(self.current_player_index) {
            p.add_score(points);
        }
    }

    /// Check the invariants a received or restored state must hold.
    pub fn validate(&self) -> Result<(), GameError> {
        if !self.players.is_empty() && self.current_player_index >= self.players.len() {
            return Err(GameError::Inconsistent("current player index out of range"));
        }
        if self.attempts > self.max_attempts {
            return Err(GameError::Inconsistent("attempts exceed max attempts"));
        }
        if self.dice1 > 6 || self.dice2 > 6 || self.dice1 < self.dice2 {
            return Err(GameError::Inconsistent("dice out of range"));
        }
        for (i, p) in self.players.iter().enumerate() {
            if self.players[..i].iter().any(|o| o.name.eq_ignore_ascii_case(&p.name)) {
                return Err(GameError::Inconsistent("duplicate player name"));
            }
        }
        if let Some(duel) = &self.duel {
            if self.max_attempts != 1 {
                return Err(GameError::Inconsistent("duel requires a single attempt"));
            }
            if self.player_index(&duel.challenger).is_none() || self.player_index(&duel.opponent).is_none() {
                return Err(GameError::Inconsistent("duel player not seated"));
            }
        }
        Ok(())
    }
}
