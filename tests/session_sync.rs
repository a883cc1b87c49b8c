//! Host and observer clients working against an in-process session store.

use async_trait::async_trait;
use pour_party::logic::ScriptedSource;
use pour_party::models::{CreateSessionRequest, CreatedSession, OwnerToken, Session, SessionUpdate};
use pour_party::session::{
    spawn_observer, ApplyOutcome, InProcessSessionApi, ObservedSession, ObserverHandle, Replica,
};
use pour_party::{GamePhase, HostSession, RoundRules, SessionApi, SessionError, SessionId};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

const POLL: Duration = Duration::from_millis(10);

fn dice(values: &[u8]) -> Box<ScriptedSource> {
    Box::new(ScriptedSource::dice(values.iter().copied()))
}

async fn host_with_players(api: InProcessSessionApi, rolls: &[u8]) -> HostSession<InProcessSessionApi> {
    let mut host = HostSession::create(api, "Friday", "Alice", RoundRules::default(), dice(rolls))
        .await
        .unwrap();
    host.add_player("Alice").await.unwrap();
    host.add_player("Bob").await.unwrap();
    host.start_game().await.unwrap();
    host
}

/// Wait until the observer has seen `pred` hold.
async fn wait_for(handle: &mut ObserverHandle, pred: impl Fn(&ObservedSession) -> bool) -> ObservedSession {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let current = handle.updates.borrow_and_update().clone();
            if pred(&current) {
                return current;
            }
            handle.updates.changed().await.unwrap();
        }
    })
    .await
    .expect("observer did not catch up")
}

const OK: u8 = 0;
const FAIL: u8 = 1;
/// Store the write but lose the response.
const DROP_RESPONSE: u8 = 2;

/// Session API whose writes can fail on demand.
#[derive(Clone)]
struct FlakyApi {
    inner: InProcessSessionApi,
    mode: Arc<AtomicU8>,
}

impl FlakyApi {
    fn new(inner: InProcessSessionApi) -> Self {
        Self {
            inner,
            mode: Arc::new(AtomicU8::new(OK)),
        }
    }

    fn set_mode(&self, mode: u8) {
        self.mode.store(mode, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionApi for FlakyApi {
    async fn create(&self, request: CreateSessionRequest) -> Result<CreatedSession, SessionError> {
        self.inner.create(request).await
    }

    async fn list(&self) -> Result<Vec<Session>, SessionError> {
        self.inner.list().await
    }

    async fn get(&self, id: SessionId) -> Result<Session, SessionError> {
        self.inner.get(id).await
    }

    async fn update(&self, id: SessionId, update: SessionUpdate) -> Result<Session, SessionError> {
        match self.mode.load(Ordering::SeqCst) {
            FAIL => Err(SessionError::Transport("connection refused".to_string())),
            DROP_RESPONSE => {
                self.inner.update(id, update).await?;
                self.set_mode(OK);
                Err(SessionError::Transport("response lost".to_string()))
            }
            _ => self.inner.update(id, update).await,
        }
    }

    async fn end(&self, id: SessionId, owner_token: OwnerToken) -> Result<(), SessionError> {
        self.inner.end(id, owner_token).await
    }
}

#[tokio::test]
async fn host_publishes_every_transition() {
    let api = InProcessSessionApi::default();
    let mut host = host_with_players(api.clone(), &[4, 6]).await;
    // create=1, two players, start
    assert_eq!(host.revision(), 4);

    host.roll_dice().await.unwrap();
    let stored = api.get(host.id()).await.unwrap();
    assert_eq!(stored.revision, 5);
    assert_eq!(stored.game_state.target_weight, 64);
    assert_eq!(&stored.game_state, host.state());
    assert!(!host.is_dirty());
}

#[tokio::test]
async fn pours_flow_to_observers() {
    let api = InProcessSessionApi::default();
    let mut host = host_with_players(api.clone(), &[5, 2]).await;
    let mut observer = spawn_observer(api.clone(), host.id(), POLL);

    let seen = wait_for(&mut observer, |o| o.session.is_some()).await;
    assert_eq!(seen.session.unwrap().game_state.phase, GamePhase::Rolling);

    host.roll_dice().await.unwrap();
    host.next_phase().await;
    let report = host.record_pour(53.0, 1_000).await.unwrap();
    assert_eq!(report.results.len(), 1);

    let revision = host.revision();
    let seen = wait_for(&mut observer, |o| {
        o.session.as_ref().is_some_and(|s| s.revision == revision)
    })
    .await;
    let state = seen.session.unwrap().game_state;
    assert_eq!(state.players[0].score, 900);
    assert_eq!(state.current_player_index, 1);
    assert!(seen.error.is_none());
    observer.stop();
}

#[tokio::test]
async fn observer_ends_when_the_session_does() {
    let api = InProcessSessionApi::default();
    let host = host_with_players(api.clone(), &[]).await;
    let mut observer = spawn_observer(api.clone(), host.id(), POLL);
    wait_for(&mut observer, |o| o.session.is_some()).await;

    host.end().await.unwrap();
    let seen = wait_for(&mut observer, |o| o.ended).await;
    assert!(seen.error.is_some());
    // Last known document stays visible.
    assert!(seen.session.is_some());
}

#[tokio::test]
async fn observer_of_unknown_session_ends_immediately() {
    let api = InProcessSessionApi::default();
    let mut observer = spawn_observer(api, SessionId::new_v4(), POLL);
    let seen = wait_for(&mut observer, |o| o.ended).await;
    assert!(seen.session.is_none());
}

#[tokio::test]
async fn failed_publish_keeps_local_state_until_flushed() {
    let store_api = InProcessSessionApi::default();
    let api = FlakyApi::new(store_api.clone());
    let mut host = HostSession::create(api.clone(), "Friday", "Alice", RoundRules::default(), dice(&[3, 1]))
        .await
        .unwrap();
    host.add_player("Alice").await.unwrap();
    host.start_game().await.unwrap();
    let acknowledged = host.revision();

    api.set_mode(FAIL);
    host.roll_dice().await.unwrap();
    assert_eq!(host.state().target_weight, 31);
    assert!(host.is_dirty());
    assert!(host.last_error().is_some());
    assert_eq!(host.revision(), acknowledged);
    assert!(host.flush().await.is_err());

    api.set_mode(OK);
    host.flush().await.unwrap();
    assert!(!host.is_dirty());
    assert!(host.last_error().is_none());
    let stored = store_api.get(host.id()).await.unwrap();
    assert_eq!(stored.game_state.target_weight, 31);
    assert_eq!(stored.revision, acknowledged + 1);
}

#[tokio::test]
async fn lost_response_is_healed_by_the_next_publish() {
    let store_api = InProcessSessionApi::default();
    let api = FlakyApi::new(store_api.clone());
    let mut host = HostSession::create(api.clone(), "Friday", "Alice", RoundRules::default(), dice(&[6, 5]))
        .await
        .unwrap();
    host.add_player("Alice").await.unwrap();
    host.start_game().await.unwrap();

    api.set_mode(DROP_RESPONSE);
    host.roll_dice().await.unwrap();
    assert!(host.is_dirty());

    // The store moved ahead of the host; the next publish adopts its revision and succeeds.
    host.next_phase().await;
    assert!(!host.is_dirty());
    let stored = store_api.get(host.id()).await.unwrap();
    assert_eq!(stored.game_state.phase, GamePhase::Measuring);
    assert_eq!(stored.revision, host.revision());
}

#[tokio::test]
async fn rules_changes_reach_the_store() {
    let api = InProcessSessionApi::default();
    let mut host = host_with_players(api.clone(), &[]).await;
    let expert = RoundRules {
        margin: 3.0,
        max_retries: 1,
        ..RoundRules::default()
    };
    host.update_rules(expert).await;
    let stored = api.get(host.id()).await.unwrap();
    assert_eq!(stored.settings, expert);
    assert_eq!(stored.game_state.margin, 3.0);
    assert_eq!(stored.game_state.max_attempts, 1);
}

#[test]
fn replica_never_moves_backwards() {
    let created = pour_party::SessionStore::new().create(
        CreateSessionRequest {
            name: "s".to_string(),
            owner: "Alice".to_string(),
            settings: None,
        },
        chrono::Utc::now(),
    );
    let mut v3 = created.session.clone();
    v3.revision = 3;
    let mut v2 = created.session.clone();
    v2.revision = 2;

    let mut replica = Replica::new(created.session.id);
    assert_eq!(replica.apply(v3.clone()), ApplyOutcome::Applied);
    assert_eq!(replica.apply(v2), ApplyOutcome::Stale);
    assert_eq!(replica.apply(v3), ApplyOutcome::Stale);
    assert_eq!(replica.revision(), 3);

    let mut other = created.session;
    other.id = SessionId::new_v4();
    other.revision = 10;
    assert_eq!(replica.apply(other), ApplyOutcome::ForeignSession);
    assert_eq!(replica.revision(), 3);
}

#[tokio::test]
async fn fewer_retries_mid_round_apply_from_the_next_round() {
    let api = InProcessSessionApi::default();
    let rules = RoundRules {
        max_retries: 3,
        ..RoundRules::default()
    };
    let mut host = HostSession::create(api.clone(), "Friday", "Alice", rules, dice(&[3, 1]))
        .await
        .unwrap();
    host.add_player("Alice").await.unwrap();
    host.add_player("Bob").await.unwrap();
    host.start_game().await.unwrap();
    host.roll_dice().await.unwrap();
    host.record_pour(80.0, 1).await.unwrap();
    host.record_pour(80.0, 2).await.unwrap();
    assert_eq!(host.state().attempts, 2);

    host.update_rules(RoundRules {
        max_retries: 1,
        ..RoundRules::default()
    })
    .await;
    assert!(!host.is_dirty());
    assert!(host.last_error().is_none());
    assert_eq!(host.state().max_attempts, 3);
    let stored = api.get(host.id()).await.unwrap();
    assert_eq!(stored.settings.max_retries, 1);
    assert_eq!(&stored.game_state, host.state());

    // Third miss still belongs to the old round; the next round uses the new count.
    host.record_pour(80.0, 3).await.unwrap();
    assert_eq!(host.state().current_player_index, 1);
    assert_eq!(host.state().phase, GamePhase::Rolling);
    assert_eq!(host.state().max_attempts, 1);
    assert!(!host.is_dirty());
}

#[tokio::test]
async fn zero_poll_interval_still_observes() {
    let api = InProcessSessionApi::default();
    let host = host_with_players(api.clone(), &[]).await;
    let mut observer = spawn_observer(api.clone(), host.id(), Duration::ZERO);
    let seen = wait_for(&mut observer, |o| o.session.is_some()).await;
    assert_eq!(seen.session.unwrap().revision, host.revision());
    observer.stop();
}
