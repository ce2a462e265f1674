//! Identifier implementation for RGASS nodes.
//!
//! Every span of text ever inserted carries an [`Identifier`]. Splitting a span
//! produces fragments whose identifiers keep the origin components and narrow
//! `offset`/`length` to the fragment, so any fragment can be traced back to the
//! span it was cut from.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::crdt::types::replica::{SessionId, SiteId};

/// A globally unique, totally ordered identifier for a span of text.
///
/// `(session, clock, site)` identifies the insert operation that created the
/// original span. `offset` and `length` locate a fragment within that span:
/// freshly inserted spans have offset 0, fragments produced by splitting have
/// the offset of their first character relative to the original span.
///
/// # Ordering
///
/// Identifiers are compared by `session`, `clock` and `site` ascending, then by
/// `offset` **descending**: of two fragments of the same span, the later one
/// sorts first. Concurrent inserts at the same anchor are kept in descending
/// identifier order, and this tie-break is what keeps that placement identical
/// on every replica. `length` breaks the remaining ties so the order is strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Identifier {
    /// Session (document epoch) of the inserting site
    pub session: SessionId,
    /// Logical clock of the inserting site when the span was created
    pub clock: u64,
    /// The inserting site
    pub site: SiteId,
    /// Offset of this fragment within the originally inserted span
    pub offset: usize,
    /// Number of characters covered by this identifier
    pub length: usize,
}

impl Identifier {
    /// Creates the identifier of a freshly inserted span.
    pub fn new(session: SessionId, clock: u64, site: SiteId, length: usize) -> Self {
        Identifier {
            session,
            clock,
            site,
            offset: 0,
            length,
        }
    }

    /// Identifier of the head sentinel every replica starts with.
    pub const fn head() -> Self {
        Identifier {
            session: 0,
            clock: 0,
            site: 0,
            offset: 0,
            length: 0,
        }
    }

    /// Identifier of the tail sentinel. It is never addressable.
    pub const fn tail() -> Self {
        Identifier {
            session: SessionId::MAX,
            clock: u64::MAX,
            site: SiteId::MAX,
            offset: 0,
            length: 0,
        }
    }

    /// Identifier of the fragment `[start, start + length)` of this span.
    ///
    /// The offset saturates; a stored span never reaches `usize::MAX`.
    pub fn fragment(&self, start: usize, length: usize) -> Self {
        Identifier {
            offset: self.offset.saturating_add(start),
            length,
            ..*self
        }
    }

    /// True when both identifiers were cut from the same inserted span.
    pub fn same_origin(&self, other: &Identifier) -> bool {
        self.session == other.session && self.clock == other.clock && self.site == other.site
    }

    /// One past the last offset covered by this identifier, if representable.
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.length)
    }

    /// True when `other` names a sub-span of the span named by `self`.
    pub fn covers(&self, other: &Identifier) -> bool {
        let within = match (self.end(), other.end()) {
            (Some(end), Some(other_end)) => other_end <= end,
            _ => false,
        };
        self.same_origin(other) && self.offset <= other.offset && within
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.session
            .cmp(&other.session)
            .then_with(|| self.clock.cmp(&other.clock))
            .then_with(|| self.site.cmp(&other.site))
            // Reversed on purpose: larger offsets sort earlier
            .then_with(|| other.offset.cmp(&self.offset))
            .then_with(|| self.length.cmp(&other.length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(session: u64, clock: u64, site: u64, offset: usize, length: usize) -> Identifier {
        Identifier {
            session,
            clock,
            site,
            offset,
            length,
        }
    }

    #[test]
    fn test_identifier_creation() {
        let id = Identifier::new(1, 5, 10, 4);
        assert_eq!(id.session, 1);
        assert_eq!(id.clock, 5);
        assert_eq!(id.site, 10);
        assert_eq!(id.offset, 0);
        assert_eq!(id.length, 4);
    }

    #[test]
    fn test_identifier_ordering() {
        // session, then clock, then site
        assert!(id(0, 9, 9, 0, 1) < id(1, 0, 0, 0, 1));
        assert!(id(1, 1, 9, 0, 1) < id(1, 2, 0, 0, 1));
        assert!(id(1, 1, 1, 0, 1) < id(1, 1, 2, 0, 1));
    }

    #[test]
    fn test_offset_sorts_descending() {
        let earlier_fragment = id(1, 1, 1, 0, 3);
        let later_fragment = id(1, 1, 1, 3, 3);

        assert!(later_fragment < earlier_fragment);
    }

    #[test]
    fn test_length_breaks_remaining_ties() {
        let short = id(1, 1, 1, 0, 2);
        let long = id(1, 1, 1, 0, 5);

        assert!(short < long);
        assert_ne!(short.cmp(&long), Ordering::Equal);
    }

    #[test]
    fn test_fragment_and_covers() {
        let root = Identifier::new(1, 2, 3, 10);
        let fragment = root.fragment(4, 3);

        assert_eq!(fragment.offset, 4);
        assert_eq!(fragment.length, 3);
        assert_eq!(fragment.end(), Some(7));
        assert!(root.covers(&fragment));
        assert!(!fragment.covers(&root));

        let nested = fragment.fragment(1, 2);
        assert_eq!(nested.offset, 5);
        assert!(root.covers(&nested));
        assert!(!Identifier::new(1, 2, 4, 10).covers(&nested));
    }

    #[test]
    fn test_overflowing_extent_is_never_covered() {
        let root = Identifier::new(1, 2, 3, 10);
        let huge = Identifier {
            offset: usize::MAX,
            length: 2,
            ..root
        };

        assert_eq!(huge.end(), None);
        assert!(!root.covers(&huge));
        assert!(!huge.covers(&root));
        assert_eq!(huge.fragment(5, 1).offset, usize::MAX);
    }

    #[test]
    fn test_sentinels_bracket_everything() {
        let some = Identifier::new(3, 7, 2, 4);
        assert!(Identifier::head() < some);
        assert!(some < Identifier::tail());
    }

    fn arb_identifier() -> impl Strategy<Value = Identifier> {
        // Small ranges so that ties on leading components are common
        (0u64..3, 0u64..3, 0u64..3, 0usize..3, 0usize..3)
            .prop_map(|(session, clock, site, offset, length)| id(session, clock, site, offset, length))
    }

    proptest! {
        #[test]
        fn order_is_antisymmetric(a in arb_identifier(), b in arb_identifier()) {
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        }

        #[test]
        fn order_is_irreflexive_and_strict(a in arb_identifier(), b in arb_identifier()) {
            prop_assert!(!(a < a));
            prop_assert_eq!(a.cmp(&b) == Ordering::Equal, a == b);
        }

        #[test]
        fn order_is_transitive(a in arb_identifier(), b in arb_identifier(), c in arb_identifier()) {
            if a < b && b < c {
                prop_assert!(a < c);
            }
            if a > b && b > c {
                prop_assert!(a > c);
            }
        }
    }
}
