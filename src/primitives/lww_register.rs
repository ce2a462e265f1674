//! Last-Writer-Wins Register (LWW-Register) CRDT.
//!
//! Each update is stamped with a [`LamportTimestamp`]. Merge keeps the value
//! with the greater stamp; equal counters are broken by the greater site id.
//!
//! # Examples
//!
//! ```
//! use crdt_rgass::primitives::LwwRegister;
//!
//! let mut a = LwwRegister::new(1);
//! a.update("hello");
//!
//! let mut b = LwwRegister::new(2);
//! b.update("world");
//!
//! a.merge(&b);
//! assert_eq!(a.value(), Some(&"world")); // same counter, greater site wins
//! ```

use serde::{Deserialize, Serialize};

use crate::crdt::{LamportTimestamp, SiteId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LwwRegister<T> {
    site: SiteId,
    clock: u64,
    stamp: LamportTimestamp,
    value: Option<T>,
}

impl<T: Clone> LwwRegister<T> {
    /// Create an empty register written by `site`.
    pub fn new(site: SiteId) -> Self {
        Self {
            site,
            clock: 0,
            stamp: LamportTimestamp::new(0, site),
            value: None,
        }
    }

    /// Overwrite the value, stamping it with this site's next clock value.
    pub fn update(&mut self, value: T) {
        self.clock += 1;
        self.stamp = LamportTimestamp::new(self.clock, self.site);
        self.value = Some(value);
    }

    /// Take a remote write if its stamp is greater than the current one.
    pub fn incorporate(&mut self, stamp: LamportTimestamp, value: Option<T>) {
        if stamp > self.stamp {
            // Later local updates must order after what was just seen
            self.clock = self.clock.max(stamp.counter);
            self.stamp = stamp;
            self.value = value;
        }
    }

    /// Merge with another register: keep the greater stamp.
    pub fn merge(&mut self, other: &Self) {
        self.incorporate(other.stamp, other.value.clone());
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn stamp(&self) -> LamportTimestamp {
        self.stamp
    }
}
