//! Local game data (settings + player stats) and its reconciliation with a remote copy.

mod local;
mod remote;
mod sync;

pub use local::{validate_filename, LocalStore, PLAYER_STATS_FILE, SETTINGS_FILE};
pub use remote::{HttpFileBackup, HttpSyncApi, RemoteStore};
pub use sync::SyncManager;

use crate::models::{GameSettings, PlayerStats};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything that gets backed up: the settings document and all player stats.
///
/// Settings stay untyped so fields this version does not know survive a round trip.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameData {
    #[serde(default)]
    pub settings: Value,
    #[serde(default)]
    pub player_stats: Vec<PlayerStats>,
}

impl GameData {
    pub fn new(settings: &GameSettings, player_stats: Vec<PlayerStats>) -> Self {
        Self {
            settings: serde_json::to_value(settings).unwrap_or(Value::Null),
            player_stats,
        }
    }

    /// Typed view of the settings; anything unreadable falls back to the defaults.
    pub fn typed_settings(&self) -> GameSettings {
        serde_json::from_value(self.settings.clone()).unwrap_or_default()
    }
}

/// Outcome of one sync attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl SyncResult {
    pub fn ok(timestamp: i64) -> Self {
        Self {
            success: true,
            error: None,
            timestamp,
        }
    }

    pub fn failed(error: impl Into<String>, timestamp: i64) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            timestamp,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StorageError {
    /// Reading or writing a local file failed.
    Io { file: String, message: String },
    /// A stored file is not valid JSON for its type.
    Parse { file: String, message: String },
    /// Filenames must be plain names inside the data directory.
    InvalidFilename(String),
    /// The remote copy could not be reached or refused the request.
    Remote(String),
    /// Another sync is still running.
    InProgress,
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io { file, message } => write!(f, "Failed to access {}: {}", file, message),
            StorageError::Parse { file, message } => write!(f, "Failed to parse {}: {}", file, message),
            StorageError::InvalidFilename(name) => write!(f, "Invalid filename '{}'", name),
            StorageError::Remote(msg) => write!(f, "Remote storage error: {}", msg),
            StorageError::InProgress => write!(f, "Sync already in progress"),
        }
    }
}

impl std::error::Error for StorageError {}
