//! Session: the replicated document a host shares with its observers.

use crate::models::game::{GameError, GameState};
use crate::models::settings::RoundRules;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a session.
pub type SessionId = Uuid;

/// Server-issued secret proving authorship of a session. Only returned to the creator.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerToken(Uuid);

impl OwnerToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for OwnerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Errors from the session store or a session client.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionError {
    /// No session with this id (expired, deleted or never created).
    NotFound(SessionId),
    /// The owner token is missing or does not match.
    Unauthorized,
    /// The write was based on an older revision than the stored one.
    StaleRevision { current: u64, base: u64 },
    /// The submitted game state breaks an invariant.
    InvalidState(GameError),
    /// The store refused the request; message as reported by the server.
    Rejected(String),
    /// Network or decoding failure talking to the store.
    Transport(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::NotFound(_) => write!(f, "Session not found"),
            SessionError::Unauthorized => write!(f, "Only the session owner may change it"),
            SessionError::StaleRevision { current, base } => {
                write!(f, "Update based on revision {} but session is at {}", base, current)
            }
            SessionError::InvalidState(e) => write!(f, "{}", e),
            SessionError::Rejected(msg) => write!(f, "{}", msg),
            SessionError::Transport(msg) => write!(f, "Session request failed: {}", msg),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<GameError> for SessionError {
    fn from(e: GameError) -> Self {
        SessionError::InvalidState(e)
    }
}

/// A multiplayer session as stored and served.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    /// Display name of the creator.
    pub owner: String,
    pub settings: RoundRules,
    pub game_state: GameState,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    /// Strictly increases with every stored write.
    pub revision: u64,
}

impl Session {
    /// New session at revision 1 with an empty game in Setup.
    pub fn new(name: impl Into<String>, owner: impl Into<String>, settings: RoundRules, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner: owner.into(),
            game_state: GameState::new(&settings),
            settings,
            created_at: now,
            last_updated: now,
            revision: 1,
        }
    }

    /// Whether `other` is a later version of this same session.
    pub fn is_superseded_by(&self, other: &Session) -> bool {
        self.id == other.id && other.revision > self.revision
    }
}

/// Body of `POST /sessions`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub settings: Option<RoundRules>,
}

/// Response to `POST /sessions`: the session plus its owner token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreatedSession {
    #[serde(flatten)]
    pub session: Session,
    pub owner_token: OwnerToken,
}

/// Body of `PUT /sessions/{id}`; omitted documents are kept as stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdate {
    pub owner_token: OwnerToken,
    /// Revision the writer last saw; rejected when the store has moved past it.
    #[serde(default)]
    pub base_revision: Option<u64>,
    #[serde(default)]
    pub settings: Option<RoundRules>,
    #[serde(default)]
    pub game_state: Option<GameState>,
}

/// Body of `DELETE /sessions/{id}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EndSessionRequest {
    pub owner_token: OwnerToken,
}
