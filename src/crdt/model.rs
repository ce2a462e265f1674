//! The node collection behind one RGASS replica.
//!
//! The model owns every node ever created in an append-only arena, an ordered
//! table from [`Identifier`] to arena index, and the document order: a doubly
//! linked list threaded through the nodes' `prev`/`next` links, bounded by a
//! head and a tail sentinel.

use crossbeam_skiplist::SkipMap;
use tracing::trace;

use crate::crdt::error::{Result, RgassError};
use crate::crdt::node::{Node, NodeIndex, SplitShape};
use crate::crdt::types::Identifier;

/// All nodes of one document replica.
///
/// # Design
///
/// - The arena only grows: identifiers, once registered, resolve forever
/// - The table is a SkipMap ordered by the identifier total order, so all
///   fragments of one inserted span sit next to each other
/// - Split nodes leave the document order; their fragments take their place
pub struct Model {
    nodes: Vec<Node>,
    table: SkipMap<Identifier, NodeIndex>,
    head: NodeIndex,
    tail: NodeIndex,
}

impl Model {
    /// Creates an empty model holding only the head and tail sentinels.
    pub fn new() -> Self {
        let mut head = Node::sentinel(Identifier::head());
        let mut tail = Node::sentinel(Identifier::tail());
        let (head_index, tail_index) = (NodeIndex(0), NodeIndex(1));
        head.next = Some(tail_index);
        tail.prev = Some(head_index);

        let table = SkipMap::new();
        // Only the head is addressable; nothing can be inserted after the tail
        table.insert(head.id, head_index);

        Model {
            nodes: vec![head, tail],
            table,
            head: head_index,
            tail: tail_index,
        }
    }

    pub fn head(&self) -> NodeIndex {
        self.head
    }

    pub fn tail(&self) -> NodeIndex {
        self.tail
    }

    /// Returns the node stored at `index`.
    ///
    /// Indices are only handed out by this model, so a foreign index is a
    /// programming error and panics.
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.0]
    }

    pub(crate) fn node_mut(&mut self, index: NodeIndex) -> &mut Node {
        &mut self.nodes[index.0]
    }

    /// Looks up the arena index registered for `id`.
    pub fn lookup(&self, id: &Identifier) -> Result<NodeIndex> {
        self.table
            .get(id)
            .map(|entry| *entry.value())
            .ok_or(RgassError::IdentifierNotFound(*id))
    }

    pub fn get(&self, id: &Identifier) -> Option<&Node> {
        self.lookup(id).ok().map(|index| self.node(index))
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.table.contains_key(id)
    }

    /// Number of registered identifiers, head sentinel included.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Most distant ancestor of `index` (the node itself if it was never split off).
    pub fn root_of(&self, index: NodeIndex) -> NodeIndex {
        self.node(index).ancestor().unwrap_or(index)
    }

    /// Finds the leaf holding `position` of the span registered as `root_id`.
    ///
    /// `position` is counted against the span's full extent, so it keeps
    /// pointing at the same character however often the span was split since.
    pub fn resolve(&self, root_id: &Identifier, position: usize) -> Result<(NodeIndex, usize)> {
        let root = self.lookup(root_id)?;
        let length = self.node(root).len();
        if position > length {
            return Err(RgassError::PositionOutOfRange { position, length });
        }
        Ok(self.descend(root, position))
    }

    /// Walks down the split tree below `index` to the leaf containing `position`.
    ///
    /// A position on a boundary between two children resolves to the end of
    /// the earlier child. `position` must not exceed the node's length.
    pub(crate) fn descend(&self, index: NodeIndex, position: usize) -> (NodeIndex, usize) {
        let mut current = index;
        let mut position = position;
        while self.node(current).is_split() {
            let mut children = self.node(current).children().children().peekable();
            while let Some(child) = children.next() {
                let length = self.node(child).len();
                if position <= length || children.peek().is_none() {
                    current = child;
                    break;
                }
                position -= length;
            }
        }
        (current, position)
    }

    /// Locates the span named by `id` within its origin root.
    ///
    /// Returns the root's index and the offset of the span inside it. A
    /// fragment identifier this replica never created itself still resolves,
    /// as long as the span it was cut from is known.
    pub fn span_of(&self, id: &Identifier) -> Result<(NodeIndex, usize)> {
        if let Ok(index) = self.lookup(id) {
            let node = self.node(index);
            return Ok((self.root_of(index), node.ancestor_offset()));
        }

        let root = self
            .origin_root(id)
            .ok_or(RgassError::IdentifierNotFound(*id))?;
        let root_id = self.node(root).id;
        if !root_id.covers(id) {
            return Err(RgassError::IdentifierNotFound(*id));
        }
        Ok((root, id.offset - root_id.offset))
    }

    /// Finds the unsplit-origin node sharing `id`'s session, clock and site.
    fn origin_root(&self, id: &Identifier) -> Option<NodeIndex> {
        // Same-origin identifiers are contiguous in the table: larger offsets first
        let lowest = Identifier {
            offset: usize::MAX,
            length: 0,
            ..*id
        };
        let highest = Identifier {
            offset: 0,
            length: usize::MAX,
            ..*id
        };
        self.table
            .range(lowest..=highest)
            .map(|entry| *entry.value())
            .find(|index| self.node(*index).ancestor().is_none())
    }

    /// Inserts `new_nodes` after `anchor` in identifier order.
    ///
    /// Starting right after the anchor, every successor with a greater
    /// identifier is skipped; each new node lands before the first successor
    /// that is not greater. Later nodes chain after the earlier ones, so
    /// siblings sharing an anchor stay in descending identifier order on every
    /// replica regardless of arrival order.
    pub fn insert_after(
        &mut self,
        anchor: NodeIndex,
        new_nodes: impl IntoIterator<Item = Node>,
    ) -> Result<Vec<NodeIndex>> {
        self.check_registered(anchor)?;
        let new_nodes: Vec<Node> = new_nodes.into_iter().collect();
        self.check_fresh(&new_nodes)?;

        let mut cursor = anchor;
        let mut placed = Vec::with_capacity(new_nodes.len());
        for node in new_nodes {
            let id = node.id;
            let index = self.allocate(node);

            let mut at = cursor;
            while let Some(next) = self.node(at).next() {
                if next == self.tail || self.node(next).id <= id {
                    break;
                }
                at = next;
            }
            self.link_after(at, index);
            cursor = index;
            placed.push(index);
        }
        Ok(placed)
    }

    /// Puts `new_nodes` in `target`'s place in the document order.
    ///
    /// No identifier scanning happens: the nodes are linked exactly in the
    /// given order. `target` stays registered but leaves the list.
    pub fn replace(
        &mut self,
        target: NodeIndex,
        new_nodes: impl IntoIterator<Item = Node>,
    ) -> Result<Vec<NodeIndex>> {
        self.check_registered(target)?;
        let new_nodes: Vec<Node> = new_nodes.into_iter().collect();
        self.check_fresh(&new_nodes)?;

        let mut cursor = target;
        let mut placed = Vec::with_capacity(new_nodes.len());
        for node in new_nodes {
            let index = self.allocate(node);
            self.link_after(cursor, index);
            cursor = index;
            placed.push(index);
        }
        if !placed.is_empty() {
            self.unlink(target);
        }
        Ok(placed)
    }

    /// Installs the two fragments produced by [`Node::split_two`] in place of `target`.
    pub fn install_two(
        &mut self,
        target: NodeIndex,
        (first, second): (Node, Node),
    ) -> Result<(NodeIndex, NodeIndex)> {
        let placed = self.replace(target, [first, second])?;
        let (first, second) = (placed[0], placed[1]);
        self.mark_split(target, SplitShape::Two { first, second });
        Ok((first, second))
    }

    /// Installs the three fragments produced by [`Node::split_three`] in place of `target`.
    pub fn install_three(
        &mut self,
        target: NodeIndex,
        (first, middle, last): (Node, Node, Node),
    ) -> Result<(NodeIndex, NodeIndex, NodeIndex)> {
        let placed = self.replace(target, [first, middle, last])?;
        let (first, middle, last) = (placed[0], placed[1], placed[2]);
        self.mark_split(
            target,
            SplitShape::Three {
                first,
                middle,
                last,
            },
        );
        Ok((first, middle, last))
    }

    /// Splits leaf `target` at `position` and installs the fragments.
    pub fn split_two(
        &mut self,
        target: NodeIndex,
        position: usize,
    ) -> Result<(NodeIndex, NodeIndex)> {
        self.check_registered(target)?;
        let fragments = self.node(target).split_two(target, position)?;
        self.install_two(target, fragments)
    }

    /// Iterates the document order from head to tail, sentinels excluded.
    pub fn traverse(&self) -> Traverse<'_> {
        Traverse {
            model: self,
            cursor: self.node(self.head).next(),
        }
    }

    fn mark_split(&mut self, target: NodeIndex, shape: SplitShape) {
        let node = self.node_mut(target);
        node.children = shape;
        node.tombstoned = true;
    }

    fn check_registered(&self, index: NodeIndex) -> Result<()> {
        let id = self
            .nodes
            .get(index.0)
            .map(|node| node.id)
            .ok_or(RgassError::UnknownNode(index))?;
        match self.table.get(&id) {
            Some(entry) if *entry.value() == index => Ok(()),
            _ => Err(RgassError::IdentifierNotFound(id)),
        }
    }

    fn check_fresh(&self, nodes: &[Node]) -> Result<()> {
        for (i, node) in nodes.iter().enumerate() {
            let repeated = nodes[..i].iter().any(|earlier| earlier.id == node.id);
            if repeated || self.contains(&node.id) {
                return Err(RgassError::DuplicateIdentifier(node.id));
            }
        }
        Ok(())
    }

    fn allocate(&mut self, node: Node) -> NodeIndex {
        let index = NodeIndex(self.nodes.len());
        self.table.insert(node.id, index);
        self.nodes.push(node);
        index
    }

    fn link_after(&mut self, anchor: NodeIndex, index: NodeIndex) {
        trace!(anchor = anchor.0, node = index.0, "linking node");
        let next = self.node(anchor).next();
        {
            let node = self.node_mut(index);
            node.prev = Some(anchor);
            node.next = next;
        }
        if let Some(next) = next {
            self.node_mut(next).prev = Some(index);
        }
        self.node_mut(anchor).next = Some(index);
    }

    fn unlink(&mut self, index: NodeIndex) {
        trace!(node = index.0, "unlinking node");
        let (prev, next) = {
            let node = self.node_mut(index);
            (node.prev.take(), node.next.take())
        };
        if let Some(prev) = prev {
            self.node_mut(prev).next = next;
        }
        if let Some(next) = next {
            self.node_mut(next).prev = prev;
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Model {
    fn clone(&self) -> Self {
        let table = SkipMap::new();

        // Copy all entries from the original table
        for entry in self.table.iter() {
            table.insert(*entry.key(), *entry.value());
        }

        Model {
            nodes: self.nodes.clone(),
            table,
            head: self.head,
            tail: self.tail,
        }
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("registered", &self.table.len())
            .field("order", &self.traverse().map(|node| node.id).collect::<Vec<_>>())
            .finish()
    }
}

/// Forward iterator over the document order. Pure read view.
pub struct Traverse<'a> {
    model: &'a Model,
    cursor: Option<NodeIndex>,
}

impl<'a> Iterator for Traverse<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        if index == self.model.tail {
            self.cursor = None;
            return None;
        }
        let node = self.model.node(index);
        self.cursor = node.next();
        Some(node)
    }
}
