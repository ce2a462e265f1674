//! Editor-facing wrapper around one RGASS replica.
//!
//! A [`Site`] speaks in visible character positions. It maps them onto node
//! identifiers, stamps new text with identifiers from its Lamport clock, and
//! queues the resulting operation records for delivery to the other sites.

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tracing::debug;

use crate::crdt::{Identifier, LamportClock, Operation, Rgass, RgassError, SessionId, SiteId};

/// Outbound queue capacity used by [`Site::new`].
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error(transparent)]
    Rgass(#[from] RgassError),

    #[error("site is closed")]
    Closed,

    #[error("outbound queue is full")]
    OutboundFull,

    #[error("position {position} is beyond the visible text of length {length}")]
    OutOfBounds { position: usize, length: usize },
}

impl<T> From<TrySendError<T>> for SiteError {
    fn from(error: TrySendError<T>) -> Self {
        match error {
            TrySendError::Full(_) => SiteError::OutboundFull,
            TrySendError::Closed(_) => SiteError::Closed,
        }
    }
}

/// One editor of a shared document.
///
/// Every site editing the same document must use the same session id; the
/// site id must be unique among them.
#[derive(Debug)]
pub struct Site {
    session: SessionId,
    clock: LamportClock,
    document: RwLock<Rgass>,
    outbound: Mutex<Option<Sender<Operation>>>,
}

impl Site {
    /// Creates a site and the receiving end of its outbound queue.
    pub fn new(session: SessionId, site: SiteId) -> (Self, Receiver<Operation>) {
        Self::with_capacity(session, site, DEFAULT_OUTBOUND_CAPACITY)
    }

    pub fn with_capacity(
        session: SessionId,
        site: SiteId,
        capacity: usize,
    ) -> (Self, Receiver<Operation>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let site = Site {
            session,
            clock: LamportClock::new(site),
            document: RwLock::new(Rgass::new()),
            outbound: Mutex::new(Some(sender)),
        };
        (site, receiver)
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn site_id(&self) -> SiteId {
        self.clock.site_id()
    }

    /// Inserts `text` so that it starts at visible `position`.
    pub fn insert(&self, position: usize, text: &str) -> Result<(), SiteError> {
        let sender = self.sender()?;
        if text.is_empty() {
            return Ok(());
        }
        // Reserve first so a full queue never leaves an unsent local edit
        let permit = sender.try_reserve()?;

        let mut document = self.document.write();
        let (anchor, offset) =
            document
                .insertion_anchor(position)
                .ok_or_else(|| SiteError::OutOfBounds {
                    position,
                    length: document.len(),
                })?;
        let id = self.next_identifier(text.chars().count());
        let operation = document.local_insert(anchor, offset, text, id)?;
        drop(document);

        debug!(site = self.site_id(), position, ?id, "queued insert");
        permit.send(operation.into());
        Ok(())
    }

    /// Deletes `length` visible characters starting at visible `position`.
    pub fn delete(&self, position: usize, length: usize) -> Result<(), SiteError> {
        let sender = self.sender()?;
        if length == 0 {
            return Ok(());
        }
        let permit = sender.try_reserve()?;

        let mut document = self.document.write();
        let (anchor, offset) =
            document
                .deletion_anchor(position)
                .ok_or_else(|| SiteError::OutOfBounds {
                    position,
                    length: document.len(),
                })?;
        let outcome = document.local_delete(anchor, offset, length)?;
        drop(document);

        debug!(
            site = self.site_id(),
            position,
            length = outcome.effective_length,
            "queued delete"
        );
        permit.send(outcome.operation().into());
        Ok(())
    }

    /// Applies an operation produced by another site.
    pub fn receive(&self, operation: &Operation) -> Result<(), SiteError> {
        self.sender()?;
        self.document.write().apply(operation)?;
        self.clock.observe(operation.max_clock());
        Ok(())
    }

    /// Returns the visible text.
    pub fn text(&self) -> String {
        self.document.read().text()
    }

    /// Copy of the current replica.
    pub fn snapshot(&self) -> Rgass {
        self.document.read().clone()
    }

    /// Stops accepting edits and ends the outbound stream.
    pub fn close(&self) {
        self.outbound.lock().take();
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.lock().is_none()
    }

    fn sender(&self) -> Result<Sender<Operation>, SiteError> {
        self.outbound.lock().clone().ok_or(SiteError::Closed)
    }

    fn next_identifier(&self, length: usize) -> Identifier {
        Identifier::new(self.session, self.clock.tick().counter, self.site_id(), length)
    }
}
