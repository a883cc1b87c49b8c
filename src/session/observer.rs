//! Observer side of a session: poll the store, keep a never-regressing replica.

use crate::models::{Session, SessionError, SessionId};
use crate::session::client::SessionApi;
use crate::session::replica::{ApplyOutcome, Replica};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Shortest poll period; a zero interval would spin.
const MIN_POLL: Duration = Duration::from_millis(1);

/// What an observer currently knows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObservedSession {
    /// Latest accepted document, `None` until the first successful poll.
    pub session: Option<Session>,
    /// Last poll failure, cleared by the next success.
    pub error: Option<String>,
    /// The session no longer exists; polling has stopped.
    pub ended: bool,
}

/// Handle to a running poller. Dropping it (and every cloned receiver) stops the polling.
pub struct ObserverHandle {
    pub updates: watch::Receiver<ObservedSession>,
    task: JoinHandle<()>,
}

impl ObserverHandle {
    /// Latest known state.
    pub fn current(&self) -> ObservedSession {
        self.updates.borrow().clone()
    }

    /// Stop polling now. A request already in flight is dropped.
    pub fn stop(self) {
        self.task.abort();
    }
}

/// Poll `GET /sessions/{id}` every `interval` into a replica.
///
/// Documents that are not newer than the replica are ignored. Not-found ends the observation.
/// Transient errors are reported and polling continues.
pub fn spawn_observer<A>(api: A, session_id: SessionId, interval: Duration) -> ObserverHandle
where
    A: SessionApi + 'static,
{
    let (tx, rx) = watch::channel(ObservedSession::default());
    let task = tokio::spawn(async move {
        let mut replica = Replica::new(session_id);
        let mut ticker = tokio::time::interval(interval.max(MIN_POLL));
        loop {
            ticker.tick().await;
            if tx.is_closed() {
                log::debug!("No observers left for session {}", session_id);
                break;
            }
            let keep_polling = poll_once(&api, &mut replica, &tx).await;
            if !keep_polling {
                break;
            }
        }
    });
    ObserverHandle { updates: rx, task }
}

/// One poll. Returns false when polling should stop.
async fn poll_once<A: SessionApi>(
    api: &A,
    replica: &mut Replica,
    tx: &watch::Sender<ObservedSession>,
) -> bool {
    match api.get(replica.session_id()).await {
        Ok(session) => {
            if replica.apply(session) == ApplyOutcome::Applied {
                let latest = replica.session().cloned();
                tx.send_modify(|view| {
                    view.session = latest;
                    view.error = None;
                });
            } else {
                tx.send_if_modified(|view| view.error.take().is_some());
            }
            true
        }
        Err(SessionError::NotFound(id)) => {
            log::info!("Session {} is gone, stopping observer", id);
            tx.send_modify(|view| {
                view.ended = true;
                view.error = Some(SessionError::NotFound(id).to_string());
            });
            false
        }
        Err(e) => {
            log::warn!("Polling session {} failed: {}", replica.session_id(), e);
            let message = e.to_string();
            tx.send_modify(|view| view.error = Some(message));
            true
        }
    }
}
