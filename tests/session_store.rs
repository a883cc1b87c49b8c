//! Integration tests for the server-side session store: ownership, revisions and expiry.

use chrono::{Duration, TimeZone, Utc};
use pour_party::models::{CreateSessionRequest, CreatedSession, OwnerToken, SessionUpdate};
use pour_party::{GamePhase, GameState, RoundRules, SessionError, SessionStore};

fn request(name: &str) -> CreateSessionRequest {
    CreateSessionRequest {
        name: name.to_string(),
        owner: "Alice".to_string(),
        settings: None,
    }
}

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap()
}

fn update(created: &CreatedSession) -> SessionUpdate {
    SessionUpdate {
        owner_token: created.owner_token,
        base_revision: None,
        settings: None,
        game_state: None,
    }
}

#[test]
fn create_starts_at_revision_one_in_setup() {
    let mut store = SessionStore::new();
    let created = store.create(request("  Friday  "), t0());
    assert_eq!(created.session.name, "Friday");
    assert_eq!(created.session.revision, 1);
    assert_eq!(created.session.game_state.phase, GamePhase::Setup);
    assert_eq!(created.session.settings, RoundRules::default());
    assert_eq!(store.get(created.session.id).unwrap(), &created.session);
}

#[test]
fn list_is_oldest_first() {
    let mut store = SessionStore::new();
    let later = store.create(request("later"), t0() + Duration::minutes(5));
    let earlier = store.create(request("earlier"), t0());
    let ids: Vec<_> = store.list().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![earlier.session.id, later.session.id]);
}

#[test]
fn only_the_owner_token_may_write() {
    let mut store = SessionStore::new();
    let created = store.create(request("s"), t0());
    let id = created.session.id;

    let forged = SessionUpdate {
        owner_token: OwnerToken::generate(),
        ..update(&created)
    };
    assert_eq!(store.update(id, forged, t0()).unwrap_err(), SessionError::Unauthorized);
    assert_eq!(
        store.end(id, OwnerToken::generate()).unwrap_err(),
        SessionError::Unauthorized
    );
    assert_eq!(store.get(id).unwrap().revision, 1);
}

#[test]
fn every_write_bumps_the_revision_and_keeps_omitted_fields() {
    let mut store = SessionStore::new();
    let created = store.create(request("s"), t0());
    let id = created.session.id;

    let rules = RoundRules {
        margin: 3.0,
        ..RoundRules::default()
    };
    let with_rules = SessionUpdate {
        settings: Some(rules),
        ..update(&created)
    };
    assert_eq!(store.update(id, with_rules, t0()).unwrap().revision, 2);

    let state = GameState::with_players(["Alice", "Bob"], &rules).unwrap();
    let with_state = SessionUpdate {
        game_state: Some(state.clone()),
        base_revision: Some(2),
        ..update(&created)
    };
    let stored = store.update(id, with_state, t0() + Duration::seconds(1)).unwrap();
    assert_eq!(stored.revision, 3);
    assert_eq!(stored.settings.margin, 3.0);
    assert_eq!(stored.game_state, state);
    assert_eq!(stored.last_updated, t0() + Duration::seconds(1));
}

#[test]
fn stale_base_revision_is_rejected() {
    let mut store = SessionStore::new();
    let created = store.create(request("s"), t0());
    let id = created.session.id;
    store.update(id, update(&created), t0()).unwrap();

    let stale = SessionUpdate {
        base_revision: Some(1),
        ..update(&created)
    };
    assert_eq!(
        store.update(id, stale, t0()).unwrap_err(),
        SessionError::StaleRevision { current: 2, base: 1 }
    );
}

#[test]
fn invalid_game_state_is_rejected() {
    let mut store = SessionStore::new();
    let created = store.create(request("s"), t0());
    let id = created.session.id;

    let mut state = GameState::with_players(["Alice"], &RoundRules::default()).unwrap();
    state.current_player_index = 3;
    let bad = SessionUpdate {
        game_state: Some(state),
        ..update(&created)
    };
    assert!(matches!(
        store.update(id, bad, t0()),
        Err(SessionError::InvalidState(_))
    ));
    assert_eq!(store.get(id).unwrap().revision, 1);
}

#[test]
fn end_removes_the_session() {
    let mut store = SessionStore::new();
    let created = store.create(request("s"), t0());
    let id = created.session.id;
    store.end(id, created.owner_token).unwrap();
    assert_eq!(store.get(id).unwrap_err(), SessionError::NotFound(id));
    assert!(store.is_empty());
    assert!(matches!(
        store.update(id, update(&created), t0()),
        Err(SessionError::NotFound(_))
    ));
}

#[test]
fn expired_sessions_are_evicted() {
    let mut store = SessionStore::new();
    let stale = store.create(request("stale"), t0());
    let active = store.create(request("active"), t0());
    store
        .update(active.session.id, update(&active), t0() + Duration::hours(5))
        .unwrap();

    let removed = store.evict_expired(t0() + Duration::hours(7), Duration::hours(6));
    assert_eq!(removed, 1);
    assert!(store.get(stale.session.id).is_err());
    assert!(store.get(active.session.id).is_ok());
    assert_eq!(store.len(), 1);
}
