//! JSON files in a data directory.

use crate::logic::update_player_stats;
use crate::models::{GameResult, GameSettings, PlayerStats};
use crate::persistence::{GameData, StorageError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "settings.json";
pub const PLAYER_STATS_FILE: &str = "player_stats.json";

/// Reject anything that could escape the data directory.
pub fn validate_filename(filename: &str) -> Result<(), StorageError> {
    let plain = !filename.is_empty()
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.contains("..")
        && !filename.contains('\0');
    if plain {
        Ok(())
    } else {
        Err(StorageError::InvalidFilename(filename.to_string()))
    }
}

/// Settings and stats documents stored as pretty-printed JSON under one directory.
#[derive(Clone, Debug)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Open (and create if needed) the data directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StorageError::Io {
            file: dir.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Raw document by plain filename; `None` when the file does not exist.
    pub fn read_document(&self, filename: &str) -> Result<Option<Value>, StorageError> {
        self.read(filename)
    }

    pub fn write_document(&self, filename: &str, data: &Value) -> Result<(), StorageError> {
        self.write(filename, data)
    }

    pub fn load_settings(&self) -> Result<GameSettings, StorageError> {
        Ok(self.read(SETTINGS_FILE)?.unwrap_or_default())
    }

    pub fn save_settings(&self, settings: &GameSettings) -> Result<(), StorageError> {
        self.write(SETTINGS_FILE, settings)
    }

    pub fn load_player_stats(&self) -> Result<Vec<PlayerStats>, StorageError> {
        Ok(self.read(PLAYER_STATS_FILE)?.unwrap_or_default())
    }

    pub fn save_player_stats(&self, stats: &[PlayerStats]) -> Result<(), StorageError> {
        self.write(PLAYER_STATS_FILE, &stats)
    }

    /// Fold one result into the stored stats and write them back.
    pub fn record_result(&self, name: &str, result: GameResult) -> Result<PlayerStats, StorageError> {
        let mut stats = self.load_player_stats()?;
        update_player_stats(&mut stats, name, result);
        self.save_player_stats(&stats)?;
        stats
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| StorageError::Io {
                file: PLAYER_STATS_FILE.to_string(),
                message: format!("stats for {} missing after update", name),
            })
    }

    /// Both documents together; `None` when neither has been written yet.
    pub fn load_game_data(&self) -> Result<Option<GameData>, StorageError> {
        let settings: Option<Value> = self.read(SETTINGS_FILE)?;
        let stats: Option<Vec<PlayerStats>> = self.read(PLAYER_STATS_FILE)?;
        if settings.is_none() && stats.is_none() {
            return Ok(None);
        }
        Ok(Some(GameData {
            settings: settings.unwrap_or(Value::Null),
            player_stats: stats.unwrap_or_default(),
        }))
    }

    pub fn save_game_data(&self, data: &GameData) -> Result<(), StorageError> {
        if !data.settings.is_null() {
            self.write(SETTINGS_FILE, &data.settings)?;
        }
        self.write(PLAYER_STATS_FILE, &data.player_stats)
    }

    fn path(&self, filename: &str) -> Result<PathBuf, StorageError> {
        validate_filename(filename)?;
        Ok(self.dir.join(filename))
    }

    fn read<T: DeserializeOwned>(&self, filename: &str) -> Result<Option<T>, StorageError> {
        let path = self.path(filename)?;
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::Io {
                    file: filename.to_string(),
                    message: e.to_string(),
                })
            }
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| StorageError::Parse {
                file: filename.to_string(),
                message: e.to_string(),
            })
    }

    /// Write via a temporary file so a crash never leaves half a document behind.
    fn write<T: Serialize + ?Sized>(&self, filename: &str, data: &T) -> Result<(), StorageError> {
        let path = self.path(filename)?;
        let io_err = |e: std::io::Error| StorageError::Io {
            file: filename.to_string(),
            message: e.to_string(),
        };
        let text = serde_json::to_string_pretty(data).map_err(|e| StorageError::Parse {
            file: filename.to_string(),
            message: e.to_string(),
        })?;
        let tmp = self.dir.join(format!(".{}.tmp", filename));
        fs::write(&tmp, text).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)?;
        log::debug!("Wrote {}", path.display());
        Ok(())
    }
}
