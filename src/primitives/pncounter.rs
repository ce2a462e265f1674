//! Counter supporting both increments and decrements (PN-Counter).
//!
//! Built from two grow-only counters: one for increments, one for
//! decrements. The value is their difference.

use serde::{Deserialize, Serialize};

use crate::crdt::SiteId;
use crate::primitives::GCounter;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnCounter {
    increments: GCounter,
    decrements: GCounter,
}

impl PnCounter {
    pub fn new(site: SiteId) -> Self {
        Self {
            increments: GCounter::new(site),
            decrements: GCounter::new(site),
        }
    }

    pub fn site(&self) -> SiteId {
        self.increments.site()
    }

    pub fn increment(&mut self) {
        self.increments.increment();
    }

    pub fn decrement(&mut self) {
        self.decrements.increment();
    }

    /// Record a remote site's `(increments, decrements)` pair.
    pub fn incorporate(&mut self, site: SiteId, (increments, decrements): (u64, u64)) {
        self.increments.incorporate(site, increments);
        self.decrements.incorporate(site, decrements);
    }

    /// Merge with another counter: per-site max of both components.
    pub fn merge(&mut self, other: &Self) {
        self.increments.merge(&other.increments);
        self.decrements.merge(&other.decrements);
    }

    /// Increments minus decrements, clamped to the range of `i64`.
    pub fn value(&self) -> i64 {
        let difference = i128::from(self.increments.value()) - i128::from(self.decrements.value());
        i64::try_from(difference).unwrap_or(if difference < 0 { i64::MIN } else { i64::MAX })
    }
}
