//! Core RGASS CRDT implementation.
//!
//! This module contains the [`Rgass`] struct: one replica of a text document
//! and the four operations that edit it. Local operations are addressed at
//! nodes of this replica; remote operations are addressed at spans as they
//! were when the originating site produced them, and are re-resolved through
//! whatever splits happened here since.

use tracing::debug;

use crate::crdt::error::{Result, RgassError};
use crate::crdt::model::{Model, Traverse};
use crate::crdt::node::{Node, NodeIndex};
use crate::crdt::operation::{DeleteOperation, InsertOperation, Operation};
use crate::crdt::types::Identifier;

/// A replicated growable array supporting strings.
///
/// # Design
///
/// - Every inserted string is one node, identified by an [`Identifier`]
/// - Inserting inside a node splits it in two; deleting part of a node splits
///   it in two or three and tombstones the deleted fragment
/// - Nothing is ever removed, so every identifier stays addressable
/// - Each operation validates before it mutates: a failed call changes nothing
#[derive(Debug, Clone, Default)]
pub struct Rgass {
    model: Model,
}

/// What a local delete did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Identifiers of the tombstoned fragments, in document order
    pub touched: Vec<Identifier>,
    /// Summed length of every touched fragment, tombstones passed over included
    pub effective_length: usize,
}

impl DeleteOutcome {
    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }

    /// The record another replica needs to reproduce this delete.
    pub fn operation(&self) -> DeleteOperation {
        DeleteOperation {
            targets: self.touched.clone(),
            position: 0,
            length: self.effective_length,
        }
    }
}

/// A contiguous range of one node scheduled for deletion.
#[derive(Debug, Clone, Copy)]
struct Piece {
    node: NodeIndex,
    position: usize,
    length: usize,
}

impl Rgass {
    /// Creates an empty replica.
    pub fn new() -> Self {
        Rgass {
            model: Model::new(),
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Identifier to target when inserting at the very start of the document.
    pub fn head_id(&self) -> Identifier {
        self.model.node(self.model.head()).id
    }

    /// Returns the node registered for `id`, tombstoned or not.
    pub fn get(&self, id: &Identifier) -> Option<&Node> {
        self.model.get(id)
    }

    /// Iterates all nodes in document order, tombstones included.
    pub fn traverse(&self) -> Traverse<'_> {
        self.model.traverse()
    }

    /// Returns the current visible content.
    pub fn text(&self) -> String {
        self.model
            .traverse()
            .filter(|node| node.is_visible())
            .map(Node::content)
            .collect()
    }

    /// Number of visible characters.
    pub fn len(&self) -> usize {
        self.model
            .traverse()
            .filter(|node| node.is_visible())
            .map(Node::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts `text` at `position` of the node registered as `anchor_id`.
    ///
    /// Returns the record to broadcast, addressed at the top-level span the
    /// anchor was cut from.
    pub fn local_insert(
        &mut self,
        anchor_id: Identifier,
        position: usize,
        text: &str,
        id: Identifier,
    ) -> Result<InsertOperation> {
        let anchor = self.model.lookup(&anchor_id)?;
        let length = self.model.node(anchor).len();
        if position > length {
            return Err(RgassError::InvalidPosition { position, length });
        }

        let (leaf, offset) = self.model.descend(anchor, position);
        self.insert_at(leaf, offset, text, id)?;
        debug!(?anchor_id, position, ?id, "local insert");

        let root = self.model.root_of(leaf);
        Ok(InsertOperation {
            target: self.model.node(root).id,
            position: self.model.node(leaf).ancestor_offset() + offset,
            text: text.to_owned(),
            id,
        })
    }

    /// Applies an insert produced by another replica.
    ///
    /// `position` is counted against the full extent of `anchor_id`.
    pub fn remote_insert(
        &mut self,
        anchor_id: Identifier,
        position: usize,
        text: &str,
        id: Identifier,
    ) -> Result<()> {
        let (leaf, offset) = self.model.resolve(&anchor_id, position)?;
        self.insert_at(leaf, offset, text, id)?;
        debug!(?anchor_id, position, ?id, "remote insert");
        Ok(())
    }

    /// Deletes `length` visible characters starting at `position` of `anchor_id`.
    ///
    /// A range running past the anchor continues through the following nodes
    /// in document order. Tombstoned nodes met on the way are passed over but
    /// reported, and their length counts towards the effective length, so the
    /// record replays identically on replicas whose tombstones differ.
    pub fn local_delete(
        &mut self,
        anchor_id: Identifier,
        position: usize,
        length: usize,
    ) -> Result<DeleteOutcome> {
        let anchor = self.model.lookup(&anchor_id)?;
        let anchor_length = self.model.node(anchor).len();
        if position > anchor_length {
            return Err(RgassError::InvalidPosition {
                position,
                length: anchor_length,
            });
        }
        if length == 0 {
            return Ok(DeleteOutcome::default());
        }

        let (leaf, offset) = self.model.descend(anchor, position);
        let pieces = self.plan_local_delete(leaf, offset, length)?;
        let effective_length: usize = pieces.iter().map(|piece| piece.length).sum();

        let mut touched = Vec::with_capacity(pieces.len());
        for piece in pieces {
            let hidden = self.delete_leaf(piece.node, piece.position, piece.length)?;
            touched.push(self.model.node(hidden).id);
        }
        debug!(
            ?anchor_id,
            position,
            length,
            effective_length,
            nodes = touched.len(),
            "local delete"
        );

        Ok(DeleteOutcome {
            touched,
            effective_length,
        })
    }

    /// Applies a delete produced by another replica.
    ///
    /// Deletes `[position, end)` of the first span in `targets`, every interior
    /// span whole, and the first `length - deleted so far` characters of the
    /// last span. Each identifier names the span it covered at the origin; a
    /// fragment this replica never split off is resolved within its root.
    pub fn remote_delete(
        &mut self,
        targets: &[Identifier],
        position: usize,
        length: usize,
    ) -> Result<()> {
        let pieces = self.plan_remote_delete(targets, position, length)?;
        let mut touched = Vec::new();
        for piece in pieces {
            self.delete_range(piece.node, piece.position, piece.length, &mut touched)?;
        }
        debug!(
            targets = targets.len(),
            position,
            length,
            fragments = touched.len(),
            "remote delete"
        );
        Ok(())
    }

    /// Applies any remote operation record.
    pub fn apply(&mut self, operation: &Operation) -> Result<()> {
        match operation {
            Operation::Insert(insert) => {
                self.remote_insert(insert.target, insert.position, &insert.text, insert.id)
            }
            Operation::Delete(delete) => {
                self.remote_delete(&delete.targets, delete.position, delete.length)
            }
        }
    }

    /// Maps a visible insert position to `(anchor, offset)`.
    ///
    /// Position 0 is the head sentinel; any other position lands at the end
    /// (or inside) of the visible node holding the preceding character.
    pub fn insertion_anchor(&self, position: usize) -> Option<(Identifier, usize)> {
        if position == 0 {
            return Some((self.head_id(), 0));
        }
        self.locate(position, |count, length| count + length >= position)
    }

    /// Maps a visible delete position to the node holding that character.
    pub fn deletion_anchor(&self, position: usize) -> Option<(Identifier, usize)> {
        self.locate(position, |count, length| count + length > position)
    }

    fn locate(
        &self,
        position: usize,
        reaches: impl Fn(usize, usize) -> bool,
    ) -> Option<(Identifier, usize)> {
        let mut count = 0;
        for node in self.model.traverse().filter(|node| node.is_visible()) {
            if reaches(count, node.len()) {
                return Some((node.id, position - count));
            }
            count += node.len();
        }
        None
    }

    fn insert_at(&mut self, leaf: NodeIndex, offset: usize, text: &str, id: Identifier) -> Result<()> {
        if text.is_empty() {
            return Err(RgassError::EmptyInsert);
        }
        if id.offset != 0 {
            return Err(RgassError::FragmentInsert(id));
        }
        let actual = text.chars().count();
        if id.length != actual {
            return Err(RgassError::LengthMismatch {
                declared: id.length,
                actual,
            });
        }
        if self.model.contains(&id) {
            return Err(RgassError::DuplicateIdentifier(id));
        }

        let node = self.model.node(leaf);
        let new_node = Node::new(id, text);
        if node.is_sentinel() || offset == node.len() {
            self.model.insert_after(leaf, [new_node])?;
            return Ok(());
        }
        if offset == 0 {
            // Would leave an empty first fragment sharing nothing with the text before it
            return Err(RgassError::InvalidPosition {
                position: offset,
                length: node.len(),
            });
        }

        let (first, _) = self.model.split_two(leaf, offset)?;
        self.model.insert_after(first, [new_node])?;
        Ok(())
    }

    /// Collects the ranges a local delete covers without touching anything.
    fn plan_local_delete(&self, leaf: NodeIndex, offset: usize, length: usize) -> Result<Vec<Piece>> {
        let mut pieces = Vec::new();
        let mut remaining = length;

        let node = self.model.node(leaf);
        let take = (node.len() - offset).min(remaining);
        if take > 0 {
            pieces.push(Piece {
                node: leaf,
                position: offset,
                length: take,
            });
            remaining -= take;
        }

        let mut cursor = node.next();
        while remaining > 0 {
            let index = match cursor {
                Some(index) if index != self.model.tail() => index,
                _ => {
                    return Err(RgassError::DeleteRangeExceedsNode {
                        position: offset,
                        length,
                        node_length: length - remaining,
                    });
                }
            };
            let node = self.model.node(index);
            cursor = node.next();

            if node.is_empty() {
                continue;
            }
            if node.is_tombstoned() {
                // Absorbed: leading tombstones are simply skipped
                if !pieces.is_empty() {
                    pieces.push(Piece {
                        node: index,
                        position: 0,
                        length: node.len(),
                    });
                }
                continue;
            }

            let take = node.len().min(remaining);
            pieces.push(Piece {
                node: index,
                position: 0,
                length: take,
            });
            remaining -= take;
        }
        Ok(pieces)
    }

    /// Turns a remote delete record into ranges of root spans.
    fn plan_remote_delete(
        &self,
        targets: &[Identifier],
        position: usize,
        length: usize,
    ) -> Result<Vec<Piece>> {
        let spans = targets
            .iter()
            .map(|id| {
                self.model
                    .span_of(id)
                    .map(|(root, start)| (root, start, id.length))
            })
            .collect::<Result<Vec<_>>>()?;

        let exceeds = |node_length: usize| RgassError::DeleteRangeExceedsNode {
            position,
            length,
            node_length,
        };

        let mut pieces = Vec::with_capacity(spans.len());
        match spans.as_slice() {
            [] => {}
            [(root, start, span_length)] => {
                if position.saturating_add(length) > *span_length {
                    return Err(exceeds(*span_length));
                }
                pieces.push(Piece {
                    node: *root,
                    position: start + position,
                    length,
                });
            }
            [(root, start, span_length), interior @ .., (last_root, last_start, last_length)] => {
                if position > *span_length {
                    return Err(exceeds(*span_length));
                }
                let mut deleted = span_length - position;
                pieces.push(Piece {
                    node: *root,
                    position: start + position,
                    length: deleted,
                });

                for (root, start, span_length) in interior {
                    pieces.push(Piece {
                        node: *root,
                        position: *start,
                        length: *span_length,
                    });
                    deleted += span_length;
                }

                let remainder = length
                    .checked_sub(deleted)
                    .filter(|remainder| remainder <= last_length)
                    .ok_or(exceeds(*last_length))?;
                pieces.push(Piece {
                    node: *last_root,
                    position: *last_start,
                    length: remainder,
                });
            }
        }
        Ok(pieces)
    }

    /// Deletes `[position, position + length)` of a possibly split node.
    ///
    /// Split nodes pass the range on to every child it overlaps, re-based to
    /// the child's own coordinates.
    fn delete_range(
        &mut self,
        index: NodeIndex,
        position: usize,
        length: usize,
        touched: &mut Vec<NodeIndex>,
    ) -> Result<()> {
        if length == 0 {
            return Ok(());
        }
        let node = self.model.node(index);
        let end = position.saturating_add(length);
        if end > node.len() {
            return Err(RgassError::DeleteRangeExceedsNode {
                position,
                length,
                node_length: node.len(),
            });
        }
        if !node.is_split() {
            touched.push(self.delete_leaf(index, position, length)?);
            return Ok(());
        }

        let children: Vec<(NodeIndex, usize)> = node
            .children()
            .children()
            .map(|child| (child, self.model.node(child).len()))
            .collect();
        let mut start = 0;
        for (child, child_length) in children {
            let child_end = start + child_length;
            let low = position.max(start);
            let high = end.min(child_end);
            if low < high {
                self.delete_range(child, low - start, high - low, touched)?;
            }
            start = child_end;
        }
        Ok(())
    }

    /// Applies one of the four single-leaf delete shapes; returns the hidden node.
    fn delete_leaf(&mut self, index: NodeIndex, position: usize, length: usize) -> Result<NodeIndex> {
        let node = self.model.node(index);
        let node_length = node.len();
        let end = position.saturating_add(length);

        if position == 0 && length == node_length {
            self.model.node_mut(index).delete_whole();
            Ok(index)
        } else if position == 0 && length > 0 && length < node_length {
            let fragments = node.delete_prior(index, length)?;
            let (first, _) = self.model.install_two(index, fragments)?;
            Ok(first)
        } else if position > 0 && end == node_length {
            let fragments = node.delete_last(index, position)?;
            let (_, second) = self.model.install_two(index, fragments)?;
            Ok(second)
        } else if position > 0 && length > 0 && end < node_length {
            let fragments = node.delete_middle(index, position, length)?;
            let (_, middle, _) = self.model.install_three(index, fragments)?;
            Ok(middle)
        } else {
            Err(RgassError::DeleteRangeExceedsNode {
                position,
                length,
                node_length,
            })
        }
    }
}
