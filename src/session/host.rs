//! Host side of a session: the only writer, publishing whole documents after each transition.

use crate::logic::{self, PourReport, RandomSource, RoundError};
use crate::models::{
    CreateSessionRequest, CreatedSession, GameError, GameState, OwnerToken, RoundRules, Session,
    SessionError, SessionId, SessionUpdate,
};
use crate::session::client::SessionApi;

/// Owns the authoritative `GameState` of one session.
///
/// Every transition is applied locally first, then the full state is published. A failed
/// publish keeps the local state (it stays authoritative), is reported through
/// `last_error`, and is healed by the next publish or an explicit `flush`.
pub struct HostSession<A: SessionApi> {
    api: A,
    session: Session,
    state: GameState,
    owner_token: OwnerToken,
    rng: Box<dyn RandomSource + Send>,
    dirty: bool,
    last_error: Option<String>,
}

impl<A: SessionApi> HostSession<A> {
    /// Create a session on the store and become its host.
    pub async fn create(
        api: A,
        name: &str,
        owner: &str,
        rules: RoundRules,
        rng: Box<dyn RandomSource + Send>,
    ) -> Result<Self, SessionError> {
        let created = api
            .create(CreateSessionRequest {
                name: name.to_string(),
                owner: owner.to_string(),
                settings: Some(rules),
            })
            .await?;
        Ok(Self::resume(api, created, rng))
    }

    /// Host an already created session, e.g. after reconnecting with the saved token.
    pub fn resume(api: A, created: CreatedSession, rng: Box<dyn RandomSource + Send>) -> Self {
        let CreatedSession { session, owner_token } = created;
        Self {
            api,
            state: session.game_state.clone(),
            session,
            owner_token,
            rng,
            dirty: false,
            last_error: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.session.id
    }

    pub fn owner_token(&self) -> OwnerToken {
        self.owner_token
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn rules(&self) -> &RoundRules {
        &self.session.settings
    }

    /// Revision of the last document the store acknowledged.
    pub fn revision(&self) -> u64 {
        self.session.revision
    }

    /// Local changes not yet acknowledged by the store.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Why the last publish failed, cleared by the next successful one.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub async fn add_player(&mut self, name: &str) -> Result<(), GameError> {
        self.state.add_player(name)?;
        self.publish().await;
        Ok(())
    }

    pub async fn remove_player(&mut self, name: &str) -> Result<(), GameError> {
        self.state.remove_player(name)?;
        self.publish().await;
        Ok(())
    }

    pub async fn start_game(&mut self) -> Result<(), GameError> {
        logic::start_game(&mut self.state)?;
        self.publish().await;
        Ok(())
    }

    pub async fn roll_dice(&mut self) -> Result<(), GameError> {
        logic::roll_dice(&mut self.state, self.rng.as_mut())?;
        self.publish().await;
        Ok(())
    }

    pub async fn next_phase(&mut self) {
        logic::next_phase(&mut self.state);
        self.publish().await;
    }

    /// Score a pour. The returned results must be fed into statistics exactly once.
    pub async fn record_pour(&mut self, measured: f64, timestamp: i64) -> Result<PourReport, RoundError> {
        let rules = self.session.settings;
        let report = logic::record_measurement(&mut self.state, &rules, measured, timestamp)?;
        self.publish().await;
        Ok(report)
    }

    /// Switch rules (e.g. another preset) for this and the following rounds.
    pub async fn update_rules(&mut self, rules: RoundRules) {
        self.session.settings = rules;
        self.state.apply_rules(&rules);
        self.publish().await;
    }

    /// Retry publishing the current state.
    pub async fn flush(&mut self) -> Result<(), SessionError> {
        self.publish().await;
        match &self.last_error {
            Some(e) if self.dirty => Err(SessionError::Transport(e.clone())),
            _ => Ok(()),
        }
    }

    /// End the session on the store.
    pub async fn end(self) -> Result<(), SessionError> {
        self.api.end(self.session.id, self.owner_token).await
    }

    async fn publish(&mut self) {
        self.dirty = true;
        let mut result = self.push().await;
        if let Err(SessionError::StaleRevision { current, .. }) = result {
            // A previous write landed but its response was lost; we are still the only writer.
            log::debug!("Session {} moved to revision {}, republishing", self.session.id, current);
            self.session.revision = current;
            result = self.push().await;
        }
        match result {
            Ok(stored) => {
                self.session = stored;
                self.dirty = false;
                self.last_error = None;
            }
            Err(e) => {
                log::warn!("Publishing session {} failed: {}", self.session.id, e);
                self.last_error = Some(e.to_string());
            }
        }
    }

    async fn push(&self) -> Result<Session, SessionError> {
        let update = SessionUpdate {
            owner_token: self.owner_token,
            base_revision: Some(self.session.revision),
            settings: Some(self.session.settings),
            game_state: Some(self.state.clone()),
        };
        self.api.update(self.session.id, update).await
    }
}
