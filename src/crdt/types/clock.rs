//! Thread-safe Lamport clock implementation for generating timestamps.
//!
//! A [`Site`](crate::site::Site) draws the `clock` component of every identifier
//! it creates from one of these, and advances it past every clock value it
//! observes in remote operations.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::crdt::types::replica::SiteId;
use crate::crdt::types::timestamp::LamportTimestamp;

/// A thread-safe clock for generating Lamport timestamps
#[derive(Debug)]
pub struct LamportClock {
    counter: AtomicU64,
    site_id: SiteId,
}

impl LamportClock {
    /// Creates a new Lamport clock
    pub fn new(site_id: SiteId) -> Self {
        LamportClock {
            counter: AtomicU64::new(0),
            site_id,
        }
    }

    /// Generates the next timestamp for this site
    pub fn tick(&self) -> LamportTimestamp {
        let counter = self.counter.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        LamportTimestamp::new(counter, self.site_id)
    }

    /// Advances the clock so the next tick is greater than `observed`.
    pub fn observe(&self, observed: u64) {
        // fetch_max never moves the counter backwards, even under contention
        self.counter.fetch_max(observed, AtomicOrdering::SeqCst);
    }

    /// Gets the current counter value
    pub fn current_counter(&self) -> u64 {
        self.counter.load(AtomicOrdering::SeqCst)
    }

    /// Gets the site ID
    pub fn site_id(&self) -> SiteId {
        self.site_id
    }
}
