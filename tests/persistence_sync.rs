//! Local store and sync manager tests against an in-memory remote.

use async_trait::async_trait;
use pour_party::persistence::{validate_filename, GameData, RemoteStore, SyncManager};
use pour_party::{GameResult, GameSettings, LocalStore, StorageError};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;

fn temp_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

fn result(score: i64, timestamp: i64) -> GameResult {
    GameResult {
        score,
        deviation: 1.0,
        target_weight: 42,
        actual_weight: 43.0,
        timestamp,
        is_perfect: false,
    }
}

/// Remote copy kept in memory. `gate` makes `save` wait until released.
#[derive(Default)]
struct MemoryRemote {
    data: Mutex<Option<GameData>>,
    fail: AtomicBool,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl MemoryRemote {
    fn stored(&self) -> Option<GameData> {
        self.data.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn load(&self) -> Result<Option<GameData>, StorageError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Remote("offline".to_string()));
        }
        Ok(self.stored())
    }

    async fn save(&self, data: &GameData) -> Result<(), StorageError> {
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Remote("offline".to_string()));
        }
        *self.data.lock().unwrap() = Some(data.clone());
        Ok(())
    }
}

/// The directory is removed when the returned `TempDir` drops.
fn manager(remote: MemoryRemote) -> (TempDir, SyncManager<MemoryRemote>) {
    let dir = temp_dir();
    let sync = SyncManager::new(LocalStore::open(dir.path()).unwrap(), remote, Duration::from_secs(3600));
    (dir, sync)
}

#[test]
fn missing_files_load_as_defaults() {
    let dir = temp_dir();
    let store = LocalStore::open(dir.path()).unwrap();
    assert_eq!(store.load_settings().unwrap(), GameSettings::default());
    assert!(store.load_player_stats().unwrap().is_empty());
    assert!(store.load_game_data().unwrap().is_none());
}

#[test]
fn results_accumulate_on_disk() {
    let dir = temp_dir();
    let store = LocalStore::open(dir.path()).unwrap();
    store.record_result("Alice", result(900, 1)).unwrap();
    let stats = store.record_result("Alice", result(-500, 2)).unwrap();
    assert_eq!(stats.games, 2);

    let reopened = LocalStore::open(dir.path()).unwrap();
    let stored = reopened.load_player_stats().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].total_score, 400);
    assert_eq!(stored[0].last_ten_games[0].timestamp, 2);
}

#[test]
fn corrupt_file_is_reported() {
    let dir = temp_dir();
    let store = LocalStore::open(dir.path()).unwrap();
    std::fs::write(dir.path().join("player_stats.json"), "{ not json").unwrap();
    assert!(matches!(
        store.load_player_stats(),
        Err(StorageError::Parse { .. })
    ));
}

#[test]
fn filenames_must_be_plain() {
    assert!(validate_filename("backup.json").is_ok());
    for bad in ["", "../x.json", "a/b.json", "a\\b.json", ".."] {
        assert_eq!(
            validate_filename(bad),
            Err(StorageError::InvalidFilename(bad.to_string()))
        );
    }
    let dir = temp_dir();
    let store = LocalStore::open(dir.path()).unwrap();
    assert!(store.write_document("../x.json", &json!({})).is_err());
}

#[tokio::test]
async fn backup_pushes_local_data() {
    let (_dir, sync) = manager(MemoryRemote::default());
    let empty = sync.sync_from_local().await;
    assert!(!empty.success);
    assert_eq!(empty.error.as_deref(), Some("No data found in local storage"));

    sync.local().save_settings(&GameSettings::default()).unwrap();
    sync.local().record_result("Alice", result(100, 1)).unwrap();
    assert!(sync.should_sync());
    let pushed = sync.sync_from_local().await;
    assert!(pushed.success);
    assert!(sync.last_sync().is_some());
    assert!(!sync.should_sync());

    let remote = sync.remote().stored().unwrap();
    assert_eq!(remote.player_stats.len(), 1);
    assert_eq!(remote.typed_settings(), GameSettings::default());
}

#[tokio::test]
async fn restore_replaces_local_data() {
    let remote = MemoryRemote::default();
    let mut settings = GameSettings::default();
    settings.active_preset_id = "expert".to_string();
    *remote.data.lock().unwrap() = Some(GameData::new(&settings, Vec::new()));
    let (_dir, sync) = manager(remote);

    assert!(sync.sync_to_local().await.success);
    assert_eq!(sync.local().load_settings().unwrap().active_preset_id, "expert");
}

#[tokio::test]
async fn reconcile_merges_both_sides() {
    let remote = MemoryRemote::default();
    let server_settings = json!({ "activePresetId": "standard", "players": ["Bob"] });
    let mut server_stats = Vec::new();
    pour_party::update_player_stats(&mut server_stats, "Alice", result(100, 1));
    pour_party::update_player_stats(&mut server_stats, "Bob", result(100, 2));
    *remote.data.lock().unwrap() = Some(GameData {
        settings: server_settings,
        player_stats: server_stats,
    });
    let (_dir, sync) = manager(remote);

    sync.local()
        .write_document("settings.json", &json!({ "activePresetId": "expert" }))
        .unwrap();
    sync.local().record_result("Alice", result(-100, 5)).unwrap();

    assert!(sync.reconcile().await.success);

    let local = sync.local().load_game_data().unwrap().unwrap();
    assert_eq!(local.settings, json!({ "activePresetId": "expert", "players": ["Bob"] }));
    let names: Vec<&str> = local.player_stats.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Alice", "Bob"]);
    assert_eq!(local.player_stats[0].last_played(), 5);
    assert_eq!(sync.remote().stored().unwrap(), local);
}

#[tokio::test]
async fn failures_are_recorded_until_the_next_success() {
    let (_dir, sync) = manager(MemoryRemote::default());
    sync.local().save_settings(&GameSettings::default()).unwrap();

    sync.remote().fail.store(true, Ordering::SeqCst);
    let failed = sync.sync_from_local().await;
    assert!(!failed.success);
    assert!(sync.last_error().unwrap().contains("offline"));
    assert!(sync.last_sync().is_none());

    sync.remote().fail.store(false, Ordering::SeqCst);
    assert!(sync.sync_from_local().await.success);
    assert!(sync.last_error().is_none());
}

#[tokio::test]
async fn second_sync_is_rejected_while_one_runs() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let remote = MemoryRemote {
        gate: Some((entered.clone(), release.clone())),
        ..MemoryRemote::default()
    };
    let (_dir, sync) = manager(remote);
    let sync = Arc::new(sync);
    sync.local().save_settings(&GameSettings::default()).unwrap();

    let running = tokio::spawn({
        let sync = sync.clone();
        async move { sync.sync_from_local().await }
    });
    entered.notified().await;
    assert!(sync.is_syncing());

    let rejected = sync.reconcile().await;
    assert!(!rejected.success);
    assert_eq!(rejected.error.as_deref(), Some("Sync already in progress"));

    release.notify_one();
    assert!(running.await.unwrap().success);
    assert!(!sync.is_syncing());
}

#[tokio::test]
async fn auto_sync_backs_up_in_the_background() {
    let dir = temp_dir();
    let sync = Arc::new(SyncManager::new(
        LocalStore::open(dir.path()).unwrap(),
        MemoryRemote::default(),
        Duration::ZERO,
    ));
    sync.local().record_result("Alice", result(100, 1)).unwrap();

    // A zero tick is clamped instead of panicking in the timer.
    let task = sync.clone().spawn_auto_sync(Duration::ZERO);
    tokio::time::timeout(Duration::from_secs(2), async {
        while sync.remote().stored().is_none() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("auto sync did not run");
    task.abort();
    assert_eq!(sync.remote().stored().unwrap().player_stats.len(), 1);
}
