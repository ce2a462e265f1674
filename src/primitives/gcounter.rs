//! Grow-only counter (G-Counter) CRDT.
//!
//! Each site maintains its own counter. The total value is the sum of all
//! site counters. Merge takes the per-site maximum.
//!
//! # Examples
//!
//! ```
//! use crdt_rgass::primitives::GCounter;
//!
//! let mut a = GCounter::new(1);
//! a.increment();
//! a.increment();
//!
//! let mut b = GCounter::new(2);
//! b.increment();
//!
//! a.merge(&b);
//! assert_eq!(a.value(), 3); // 2 + 1
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::crdt::SiteId;

/// A grow-only counter owned by one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GCounter {
    site: SiteId,
    /// Site ID → that site's count.
    counts: HashMap<SiteId, u64>,
}

impl GCounter {
    /// Create a new empty counter for `site`.
    pub fn new(site: SiteId) -> Self {
        Self {
            site,
            counts: HashMap::new(),
        }
    }

    pub fn site(&self) -> SiteId {
        self.site
    }

    /// Increment this site's count by 1.
    pub fn increment(&mut self) {
        *self.counts.entry(self.site).or_insert(0) += 1;
    }

    /// Record a remote site's count; lower values than known are ignored.
    pub fn incorporate(&mut self, site: SiteId, count: u64) {
        let entry = self.counts.entry(site).or_insert(0);
        *entry = (*entry).max(count);
    }

    /// Merge with another counter: per-site max.
    pub fn merge(&mut self, other: &Self) {
        for (&site, &count) in &other.counts {
            self.incorporate(site, count);
        }
    }

    /// Sum of all site counts.
    /// Sum over all sites, saturating at `u64::MAX`.
    pub fn value(&self) -> u64 {
        self.counts
            .values()
            .fold(0u64, |total, count| total.saturating_add(*count))
    }

    /// Count contributed by one site.
    pub fn site_value(&self, site: SiteId) -> u64 {
        self.counts.get(&site).copied().unwrap_or(0)
    }
}
