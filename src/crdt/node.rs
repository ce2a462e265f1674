//! Node definition for the RGASS CRDT.
//!
//! A node is a span of inserted text. Once created its content never changes;
//! the only things that happen to it afterwards are being split into two or
//! three fragments and being tombstoned. Nodes live in the [`Model`]'s arena
//! and refer to each other through [`NodeIndex`] values.
//!
//! [`Model`]: crate::crdt::Model

use crate::crdt::error::{Result, RgassError};
use crate::crdt::types::Identifier;

/// Index of a node in the arena owned by a [`Model`](crate::crdt::Model).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    /// Position of the node in its model's arena.
    pub fn get(self) -> usize {
        self.0
    }
}

/// The ways a node can be divided. No other shape exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitShape {
    #[default]
    Leaf,
    Two {
        first: NodeIndex,
        second: NodeIndex,
    },
    Three {
        first: NodeIndex,
        middle: NodeIndex,
        last: NodeIndex,
    },
}

impl SplitShape {
    /// Children in content order; empty for a leaf.
    pub fn children(self) -> impl Iterator<Item = NodeIndex> {
        let (first, second, third) = match self {
            SplitShape::Leaf => (None, None, None),
            SplitShape::Two { first, second } => (Some(first), Some(second), None),
            SplitShape::Three {
                first,
                middle,
                last,
            } => (Some(first), Some(middle), Some(last)),
        };
        first.into_iter().chain(second).chain(third)
    }

    pub fn is_leaf(self) -> bool {
        matches!(self, SplitShape::Leaf)
    }
}

/// A span of text within the RGASS.
///
/// # Tombstone Deletion
///
/// Nodes are never removed. Deleting text marks the covering node (or the
/// fragment split off for the deleted range) as tombstoned; it stays in the
/// document order and in the model's table so later operations can still
/// address it.
#[derive(Debug, Clone)]
pub struct Node {
    /// Identifier of the span this node covers
    pub id: Identifier,
    content: String,
    pub(crate) tombstoned: bool,
    sentinel: bool,
    pub(crate) children: SplitShape,
    pub(crate) prev: Option<NodeIndex>,
    pub(crate) next: Option<NodeIndex>,
    ancestor: Option<NodeIndex>,
    ancestor_offset: usize,
}

impl Node {
    /// Creates a visible, unsplit node for freshly inserted text.
    pub fn new(id: Identifier, content: impl Into<String>) -> Self {
        Node {
            id,
            content: content.into(),
            tombstoned: false,
            sentinel: false,
            children: SplitShape::Leaf,
            prev: None,
            next: None,
            ancestor: None,
            ancestor_offset: 0,
        }
    }

    /// Creates a sentinel node marking one end of the document.
    pub(crate) fn sentinel(id: Identifier) -> Self {
        Node {
            sentinel: true,
            ..Node::new(id, String::new())
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Authoritative span length, independent of tombstoning.
    pub fn len(&self) -> usize {
        self.id.length
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_split(&self) -> bool {
        !self.children.is_leaf()
    }

    pub fn is_tombstoned(&self) -> bool {
        self.tombstoned
    }

    pub fn is_sentinel(&self) -> bool {
        self.sentinel
    }

    /// Returns true if this node contributes to the visible text.
    pub fn is_visible(&self) -> bool {
        !self.tombstoned && !self.sentinel
    }

    pub fn children(&self) -> SplitShape {
        self.children
    }

    pub fn next(&self) -> Option<NodeIndex> {
        self.next
    }

    pub fn prev(&self) -> Option<NodeIndex> {
        self.prev
    }

    /// Most distant node this one was split from, if any.
    pub fn ancestor(&self) -> Option<NodeIndex> {
        self.ancestor
    }

    /// Offset of this node's first character within its most distant ancestor.
    pub fn ancestor_offset(&self) -> usize {
        self.ancestor_offset
    }

    /// Tombstones the whole node. Sentinels are never hidden.
    pub fn delete_whole(&mut self) {
        if !self.sentinel {
            self.tombstoned = true;
        }
    }

    /// Splits into `[0, position)` and `[position, len)`, hiding the first.
    pub fn delete_prior(&self, this: NodeIndex, position: usize) -> Result<(Node, Node)> {
        let (mut first, second) = self.split_two(this, position)?;
        first.tombstoned = true;
        Ok((first, second))
    }

    /// Splits into `[0, position)` and `[position, len)`, hiding the second.
    pub fn delete_last(&self, this: NodeIndex, position: usize) -> Result<(Node, Node)> {
        let (first, mut second) = self.split_two(this, position)?;
        second.tombstoned = true;
        Ok((first, second))
    }

    /// Splits out `[position, position + length)` and hides it.
    pub fn delete_middle(
        &self,
        this: NodeIndex,
        position: usize,
        length: usize,
    ) -> Result<(Node, Node, Node)> {
        let (first, mut middle, last) = self.split_three(this, position, length)?;
        middle.tombstoned = true;
        Ok((first, middle, last))
    }

    /// Produces the two fragments `[0, position)` and `[position, len)`.
    ///
    /// `this` must be the index of `self` in its model; the fragments record it
    /// (or `self`'s own ancestor) as their ancestor. Nothing is mutated here:
    /// the model installs the fragments and marks `self` as split.
    pub fn split_two(&self, this: NodeIndex, position: usize) -> Result<(Node, Node)> {
        self.check_splittable(position)?;
        let (head, tail) = split_chars(&self.content, position);

        let first = self.fragment(this, 0, position, head);
        let second = self.fragment(this, position, self.len() - position, tail);
        Ok((first, second))
    }

    /// Produces `[0, position)`, `[position, position + length)` and the rest.
    pub fn split_three(
        &self,
        this: NodeIndex,
        position: usize,
        length: usize,
    ) -> Result<(Node, Node, Node)> {
        self.check_splittable(position)?;
        let end = position
            .checked_add(length)
            .filter(|end| *end <= self.len())
            .ok_or(RgassError::InvalidPosition {
                position: position.saturating_add(length),
                length: self.len(),
            })?;

        let (head, rest) = split_chars(&self.content, position);
        let (middle, tail) = split_chars(rest, length);

        let first = self.fragment(this, 0, position, head);
        let middle = self.fragment(this, position, length, middle);
        let last = self.fragment(this, end, self.len() - end, tail);
        Ok((first, middle, last))
    }

    fn check_splittable(&self, position: usize) -> Result<()> {
        if self.is_split() {
            return Err(RgassError::AlreadySplit(self.id));
        }
        if self.sentinel || position > self.len() {
            return Err(RgassError::InvalidPosition {
                position,
                length: self.len(),
            });
        }
        Ok(())
    }

    fn fragment(&self, this: NodeIndex, start: usize, length: usize, content: &str) -> Node {
        Node {
            id: self.id.fragment(start, length),
            content: content.to_owned(),
            // a fragment of hidden text stays hidden
            tombstoned: self.tombstoned,
            sentinel: false,
            children: SplitShape::Leaf,
            prev: None,
            next: None,
            ancestor: Some(self.ancestor.unwrap_or(this)),
            ancestor_offset: self.ancestor_offset + start,
        }
    }
}

/// Splits `text` after `chars` characters.
pub(crate) fn split_chars(text: &str, chars: usize) -> (&str, &str) {
    let at = text
        .char_indices()
        .nth(chars)
        .map_or(text.len(), |(byte, _)| byte);
    text.split_at(at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn node(text: &str) -> Node {
        Node::new(Identifier::new(1, 1, 1, text.chars().count()), text)
    }

    #[test]
    fn test_node_creation() {
        let id = Identifier::new(1, 1, 1, 5);
        let node = Node::new(id, "Hello");

        assert_eq!(node.id, id);
        assert_eq!(node.content(), "Hello");
        assert_eq!(node.len(), 5);
        assert!(node.is_visible());
        assert!(!node.is_split());
        assert!(node.ancestor().is_none());
    }

    #[test]
    fn test_split_two() {
        let node = node("Hello");
        let (first, second) = node.split_two(NodeIndex(7), 2).unwrap();

        assert_eq!(first.content(), "He");
        assert_eq!(second.content(), "llo");
        assert_eq!(first.id.offset, 0);
        assert_eq!(first.len(), 2);
        assert_eq!(second.id.offset, 2);
        assert_eq!(second.len(), 3);
        assert_eq!(first.ancestor(), Some(NodeIndex(7)));
        assert_eq!(second.ancestor(), Some(NodeIndex(7)));
        assert_eq!(second.ancestor_offset(), 2);
    }

    #[test]
    fn test_split_keeps_most_distant_ancestor() {
        let root = node("abcdefgh");
        let (_, second) = root.split_two(NodeIndex(1), 3).unwrap();
        let (_, middle, last) = second.split_three(NodeIndex(2), 1, 2).unwrap();

        assert_eq!(middle.content(), "ef");
        assert_eq!(middle.ancestor(), Some(NodeIndex(1)));
        assert_eq!(middle.ancestor_offset(), 4);
        assert_eq!(middle.id.offset, 4);
        assert_eq!(last.content(), "gh");
        assert_eq!(last.ancestor_offset(), 6);
    }

    #[test]
    fn test_split_rejects_bad_positions() {
        let node = node("abc");

        assert_eq!(
            node.split_two(NodeIndex(1), 4).unwrap_err(),
            RgassError::InvalidPosition {
                position: 4,
                length: 3
            }
        );
        assert!(node.split_three(NodeIndex(1), 2, 2).is_err());
        assert!(node.split_three(NodeIndex(1), 1, usize::MAX).is_err());
        assert!(node.split_three(NodeIndex(1), 1, 2).is_ok());
    }

    #[test]
    fn test_split_node_cannot_split_again() {
        let mut node = node("abc");
        node.children = SplitShape::Two {
            first: NodeIndex(2),
            second: NodeIndex(3),
        };

        assert_eq!(
            node.split_two(NodeIndex(1), 1).unwrap_err(),
            RgassError::AlreadySplit(node.id)
        );
    }

    #[test]
    fn test_deletion_helpers() {
        let node = node("test");

        let (first, second) = node.delete_prior(NodeIndex(1), 1).unwrap();
        assert!(first.is_tombstoned() && !second.is_tombstoned());

        let (first, second) = node.delete_last(NodeIndex(1), 1).unwrap();
        assert!(!first.is_tombstoned() && second.is_tombstoned());

        let (first, middle, last) = node.delete_middle(NodeIndex(1), 1, 2).unwrap();
        assert_eq!(middle.content(), "es");
        assert!(!first.is_tombstoned() && middle.is_tombstoned() && !last.is_tombstoned());
    }

    #[test]
    fn test_fragments_of_tombstone_stay_hidden() {
        let mut node = node("gone");
        node.delete_whole();

        let (first, second) = node.split_two(NodeIndex(1), 2).unwrap();
        assert!(first.is_tombstoned());
        assert!(second.is_tombstoned());
    }

    #[test]
    fn test_sentinel_is_never_hidden() {
        let mut head = Node::sentinel(Identifier::head());
        head.delete_whole();

        assert!(!head.is_tombstoned());
        assert!(!head.is_visible());
        assert!(head.split_two(NodeIndex(0), 0).is_err());
    }

    #[test]
    fn test_split_counts_characters() {
        let node = node("héllo🦀!");
        let (first, second) = node.split_two(NodeIndex(1), 2).unwrap();

        assert_eq!(first.content(), "hé");
        assert_eq!(second.content(), "llo🦀!");

        let (_, crab, _) = node.split_three(NodeIndex(1), 5, 1).unwrap();
        assert_eq!(crab.content(), "🦀");
    }

    #[test]
    fn test_split_shape_children() {
        assert_eq!(SplitShape::Leaf.children().count(), 0);
        let three = SplitShape::Three {
            first: NodeIndex(1),
            middle: NodeIndex(2),
            last: NodeIndex(3),
        };
        assert_eq!(
            three.children().collect::<Vec<_>>(),
            vec![NodeIndex(1), NodeIndex(2), NodeIndex(3)]
        );
    }

    proptest! {
        #[test]
        fn split_two_preserves_content(text in "\\PC{0,24}", cut in 0usize..=24) {
            let node = node(&text);
            let position = cut.min(node.len());
            let (first, second) = node.split_two(NodeIndex(1), position).unwrap();

            prop_assert_eq!(format!("{}{}", first.content(), second.content()), text);
            prop_assert_eq!(first.len() + second.len(), node.len());
            prop_assert_eq!(first.content().chars().count(), first.len());
        }

        #[test]
        fn split_three_preserves_content(
            text in "\\PC{0,24}",
            cut in 0usize..=24,
            width in 0usize..=24,
        ) {
            let node = node(&text);
            let position = cut.min(node.len());
            let length = width.min(node.len() - position);
            let (first, middle, last) = node.split_three(NodeIndex(1), position, length).unwrap();

            prop_assert_eq!(
                format!("{}{}{}", first.content(), middle.content(), last.content()),
                text
            );
            prop_assert_eq!(middle.len(), length);
            prop_assert_eq!(middle.content().chars().count(), length);
            prop_assert_eq!(last.id.offset, position + length);
        }
    }
}
