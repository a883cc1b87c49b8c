//! Read-only copy of a session that never moves backwards.

use crate::models::{GameState, Session, SessionId};

/// What `Replica::apply` did with an incoming document.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ApplyOutcome {
    /// Newer revision; now current.
    Applied,
    /// Same or older revision; ignored.
    Stale,
    /// Document for another session; ignored.
    ForeignSession,
}

/// Latest known version of one session.
#[derive(Clone, Debug)]
pub struct Replica {
    session_id: SessionId,
    current: Option<Session>,
}

impl Replica {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            current: None,
        }
    }

    /// Start from a known document.
    pub fn from_session(session: Session) -> Self {
        Self {
            session_id: session.id,
            current: Some(session),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn session(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn game_state(&self) -> Option<&GameState> {
        self.current.as_ref().map(|s| &s.game_state)
    }

    pub fn revision(&self) -> u64 {
        self.current.as_ref().map_or(0, |s| s.revision)
    }

    /// Take `incoming` only if it is a strictly newer revision of this session.
    pub fn apply(&mut self, incoming: Session) -> ApplyOutcome {
        if incoming.id != self.session_id {
            return ApplyOutcome::ForeignSession;
        }
        let newer = self
            .current
            .as_ref()
            .map_or(true, |current| current.is_superseded_by(&incoming));
        if !newer {
            log::debug!(
                "Ignoring revision {} of session {} (have {})",
                incoming.revision,
                incoming.id,
                self.revision()
            );
            return ApplyOutcome::Stale;
        }
        self.current = Some(incoming);
        ApplyOutcome::Applied
    }
}
