//! Session synchronization: server store, host writer, polling observers.
//!
//! Pull model with a single writer per session. The host holds the owner token and replaces
//! the whole document after each transition; observers poll and keep the newest revision.

mod client;
mod host;
mod observer;
mod replica;
mod store;

pub use client::{ErrorBody, HttpSessionApi, InProcessSessionApi, SessionApi};
pub use host::HostSession;
pub use observer::{spawn_observer, ObservedSession, ObserverHandle};
pub use replica::{ApplyOutcome, Replica};
pub use store::SessionStore;
