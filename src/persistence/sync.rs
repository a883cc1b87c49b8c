//! Backup and restore between the local store and a remote copy.

use crate::logic::{merge_player_stats, merge_settings};
use crate::persistence::{GameData, LocalStore, RemoteStore, StorageError, SyncResult};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

const MIN_TICK: Duration = Duration::from_millis(1);

#[derive(Debug, Default)]
struct SyncStatus {
    last_sync: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Clears the in-flight flag when the sync finishes, however it finishes.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, StorageError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight(flag))
            .map_err(|_| StorageError::InProgress)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs at most one sync at a time between `LocalStore` and a `RemoteStore`.
pub struct SyncManager<R: RemoteStore> {
    local: LocalStore,
    remote: R,
    backup_interval: Duration,
    in_flight: AtomicBool,
    status: Mutex<SyncStatus>,
}

impl<R: RemoteStore> SyncManager<R> {
    pub fn new(local: LocalStore, remote: R, backup_interval: Duration) -> Self {
        Self {
            local,
            remote,
            backup_interval,
            in_flight: AtomicBool::new(false),
            status: Mutex::new(SyncStatus::default()),
        }
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Time of the last successful sync in either direction.
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.status.lock().ok().and_then(|s| s.last_sync)
    }

    /// Error of the most recent attempt, cleared by the next success.
    pub fn last_error(&self) -> Option<String> {
        self.status.lock().ok().and_then(|s| s.last_error.clone())
    }

    /// Whether the backup interval has elapsed since the last successful sync.
    pub fn should_sync(&self) -> bool {
        match self.last_sync() {
            None => true,
            Some(last) => {
                let elapsed = Utc::now().signed_duration_since(last);
                elapsed.to_std().map_or(true, |e| e >= self.backup_interval)
            }
        }
    }

    /// Push local data to the remote.
    pub async fn sync_from_local(&self) -> SyncResult {
        let result = match InFlight::acquire(&self.in_flight) {
            Ok(_guard) => self.push_local().await,
            Err(e) => return SyncResult::failed(e.to_string(), Utc::now().timestamp_millis()),
        };
        self.finish("backup", result)
    }

    /// Replace local data with the remote copy.
    pub async fn sync_to_local(&self) -> SyncResult {
        let result = match InFlight::acquire(&self.in_flight) {
            Ok(_guard) => self.pull_remote().await,
            Err(e) => return SyncResult::failed(e.to_string(), Utc::now().timestamp_millis()),
        };
        self.finish("restore", result)
    }

    /// Fetch the remote copy, merge it into local data, save locally and push the merge back.
    pub async fn reconcile(&self) -> SyncResult {
        let result = match InFlight::acquire(&self.in_flight) {
            Ok(_guard) => self.merge_both().await,
            Err(e) => return SyncResult::failed(e.to_string(), Utc::now().timestamp_millis()),
        };
        self.finish("reconcile", result)
    }

    /// Back up every `tick` whenever the backup interval has elapsed. Abort the handle to stop.
    pub fn spawn_auto_sync(self: Arc<Self>, tick: Duration) -> JoinHandle<()>
    where
        R: 'static,
    {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick.max(MIN_TICK));
            loop {
                ticker.tick().await;
                if self.should_sync() && !self.is_syncing() {
                    self.sync_from_local().await;
                }
            }
        })
    }

    async fn push_local(&self) -> Result<(), String> {
        let data = self
            .local
            .load_game_data()
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "No data found in local storage".to_string())?;
        self.remote.save(&data).await.map_err(|e| e.to_string())
    }

    async fn pull_remote(&self) -> Result<(), String> {
        let data = self
            .remote
            .load()
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "No data found in remote storage".to_string())?;
        self.local.save_game_data(&data).map_err(|e| e.to_string())
    }

    async fn merge_both(&self) -> Result<(), String> {
        let server = self.remote.load().await.map_err(|e| e.to_string())?;
        let local = self.local.load_game_data().map_err(|e| e.to_string())?;
        let merged = match (local, server) {
            (Some(local), Some(server)) => GameData {
                settings: merge_settings(&local.settings, &server.settings),
                player_stats: merge_player_stats(&local.player_stats, &server.player_stats),
            },
            (Some(only), None) | (None, Some(only)) => only,
            (None, None) => return Err("No data found in local or remote storage".to_string()),
        };
        self.local.save_game_data(&merged).map_err(|e| e.to_string())?;
        self.remote.save(&merged).await.map_err(|e| e.to_string())
    }

    fn finish(&self, what: &str, result: Result<(), String>) -> SyncResult {
        let now = Utc::now();
        let mut status = match self.status.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match result {
            Ok(()) => {
                log::debug!("Sync ({}) finished", what);
                status.last_sync = Some(now);
                status.last_error = None;
                SyncResult::ok(now.timestamp_millis())
            }
            Err(error) => {
                log::warn!("Sync ({}) failed: {}", what, error);
                status.last_error = Some(error.clone());
                SyncResult::failed(error, now.timestamp_millis())
            }
        }
    }
}
