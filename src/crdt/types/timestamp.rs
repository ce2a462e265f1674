//! Lamport timestamp implementation for causal ordering in distributed systems.
//!
//! This module contains the LamportTimestamp struct which provides a total ordering
//! of events across sites. The last-writer-wins register uses it directly; the
//! text CRDT embeds the same `(counter, site)` pair in its identifiers.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::crdt::types::replica::SiteId;

/// A Lamport timestamp, consisting of a logical counter and the originating site's ID.
///
/// The combination of counter and site_id ensures that no two events from different
/// sites ever carry the same timestamp.
///
/// # Ordering
///
/// Lamport timestamps are ordered first by counter, then by site_id. This ensures
/// a deterministic global ordering of all events across all sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LamportTimestamp {
    /// The logical clock value when this timestamp was created
    pub counter: u64,
    /// The ID of the site that created this timestamp
    pub site_id: SiteId,
}

impl LamportTimestamp {
    pub fn new(counter: u64, site_id: SiteId) -> Self {
        LamportTimestamp { counter, site_id }
    }
}

impl PartialOrd for LamportTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LamportTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        // First compare by counter (logical time)
        match self.counter.cmp(&other.counter) {
            // Equal counters are concurrent; the site id breaks the tie
            Ordering::Equal => self.site_id.cmp(&other.site_id),
            other => other,
        }
    }
}
