//! Authoritative replica shared by every WebSocket session.
//!
//! The hub applies each submitted operation to its own replica, appends it to
//! the history and fans it out to the other sessions. Applying, recording and
//! relaying happen under one write lock, so every session observes the same
//! order the history records.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, broadcast};
use tracing::debug;

use crate::crdt::{Operation, Rgass, RgassError, SessionId, SiteId};

/// An operation on its way to every session except the one that sent it.
#[derive(Debug, Clone)]
pub struct Relayed {
    pub origin: SiteId,
    pub operation: Operation,
}

#[derive(Debug, Default)]
struct HubState {
    replica: Rgass,
    history: Vec<Operation>,
}

#[derive(Debug)]
pub struct Hub {
    session: SessionId,
    state: RwLock<HubState>,
    updates: broadcast::Sender<Relayed>,
    next_site: AtomicU64,
    started_at: DateTime<Utc>,
}

impl Hub {
    /// Creates a hub relaying through a buffer of `capacity` operations.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0; [`ServerConfig`](super::ServerConfig) never yields that.
    pub fn new(session: SessionId, capacity: usize) -> Self {
        let (updates, _) = broadcast::channel(capacity);
        Hub {
            session,
            state: RwLock::new(HubState::default()),
            updates,
            next_site: AtomicU64::new(1),
            started_at: Utc::now(),
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Hands out a site id no other session of this hub has.
    pub fn register(&self) -> SiteId {
        self.next_site.fetch_add(1, Ordering::SeqCst)
    }

    /// Returns the history so far and a subscription to everything after it.
    pub async fn join(&self) -> (Vec<Operation>, broadcast::Receiver<Relayed>) {
        let state = self.state.read().await;
        (state.history.clone(), self.updates.subscribe())
    }

    /// Applies `operation` and relays it to every other session.
    ///
    /// A rejected operation is neither recorded nor relayed.
    pub async fn submit(&self, origin: SiteId, operation: Operation) -> Result<(), RgassError> {
        let mut state = self.state.write().await;
        state.replica.apply(&operation)?;
        state.history.push(operation.clone());

        let receivers = self
            .updates
            .send(Relayed { origin, operation })
            .unwrap_or(0);
        debug!(origin, receivers, history = state.history.len(), "relayed operation");
        Ok(())
    }

    pub async fn text(&self) -> String {
        self.state.read().await.replica.text()
    }

    pub async fn operation_count(&self) -> usize {
        self.state.read().await.history.len()
    }
}
