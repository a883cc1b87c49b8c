//! Server-side session store: owner-token checked, revisioned, TTL-evicted.

use crate::models::{
    CreateSessionRequest, CreatedSession, OwnerToken, Session, SessionError, SessionId, SessionUpdate,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Stored session plus the secret that authorizes writes to it.
struct SessionEntry {
    session: Session,
    owner_token: OwnerToken,
}

/// In-memory sessions by id. One writer per session: the holder of its owner token.
#[derive(Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, SessionEntry>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Create a session owned by `request.owner`. The returned token is the only copy handed out.
    pub fn create(&mut self, request: CreateSessionRequest, now: DateTime<Utc>) -> CreatedSession {
        let settings = request.settings.unwrap_or_default();
        let session = Session::new(request.name.trim(), request.owner.trim(), settings, now);
        let owner_token = OwnerToken::generate();
        log::info!("Created session {} ({}) for {}", session.id, session.name, session.owner);
        self.sessions.insert(
            session.id,
            SessionEntry {
                session: session.clone(),
                owner_token,
            },
        );
        CreatedSession { session, owner_token }
    }

    /// All sessions, oldest first.
    pub fn list(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self.sessions.values().map(|e| e.session.clone()).collect();
        sessions.sort_by_key(|s| s.created_at);
        sessions
    }

    pub fn get(&self, id: SessionId) -> Result<&Session, SessionError> {
        self.sessions
            .get(&id)
            .map(|e| &e.session)
            .ok_or(SessionError::NotFound(id))
    }

    /// Apply an owner's partial update: omitted documents are kept, the revision is bumped.
    pub fn update(
        &mut self,
        id: SessionId,
        update: SessionUpdate,
        now: DateTime<Utc>,
    ) -> Result<&Session, SessionError> {
        let entry = self.sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        if entry.owner_token != update.owner_token {
            log::warn!("Rejected write to session {} without a valid owner token", id);
            return Err(SessionError::Unauthorized);
        }
        let current = entry.session.revision;
        if let Some(base) = update.base_revision {
            if base != current {
                return Err(SessionError::StaleRevision { current, base });
            }
        }
        if let Some(state) = &update.game_state {
            state.validate()?;
        }

        let session = &mut entry.session;
        if let Some(settings) = update.settings {
            session.settings = settings;
        }
        if let Some(state) = update.game_state {
            session.game_state = state;
        }
        session.revision = current + 1;
        session.last_updated = now.max(session.last_updated);
        Ok(&*session)
    }

    /// End a session on its owner's request.
    pub fn end(&mut self, id: SessionId, owner_token: OwnerToken) -> Result<Session, SessionError> {
        let entry = self.sessions.get(&id).ok_or(SessionError::NotFound(id))?;
        if entry.owner_token != owner_token {
            return Err(SessionError::Unauthorized);
        }
        let removed = self.sessions.remove(&id).ok_or(SessionError::NotFound(id))?;
        log::info!("Ended session {}", id);
        Ok(removed.session)
    }

    /// Drop sessions not updated within `ttl`. Returns how many were removed.
    pub fn evict_expired(&mut self, now: DateTime<Utc>, ttl: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| now.signed_duration_since(entry.session.last_updated) < ttl);
        before - self.sessions.len()
    }
}
