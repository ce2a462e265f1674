//! Errors surfaced by the RGASS core.
//!
//! Every error is deterministic for a given replica state and input, and is
//! detected before any mutation takes place.

use crate::crdt::node::NodeIndex;
use crate::crdt::types::Identifier;

/// Failure of a model or RGASS operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RgassError {
    /// The operation targets an identifier this replica does not know.
    #[error("identifier not found: {0:?}")]
    IdentifierNotFound(Identifier),

    /// A split or insert position lies outside the node it addresses.
    #[error("invalid position {position} in node of length {length}")]
    InvalidPosition { position: usize, length: usize },

    /// A resolve position lies beyond the extent of the root span.
    #[error("position {position} is out of range for span of length {length}")]
    PositionOutOfRange { position: usize, length: usize },

    /// An inserted identifier is already present in the model.
    #[error("identifier already present: {0:?}")]
    DuplicateIdentifier(Identifier),

    /// A delete range cannot be decomposed over the addressed node(s).
    #[error("delete of {length} at {position} exceeds node of length {node_length}")]
    DeleteRangeExceedsNode {
        position: usize,
        length: usize,
        node_length: usize,
    },

    /// The node was already split and can only be addressed through its children.
    #[error("node already split: {0:?}")]
    AlreadySplit(Identifier),

    /// The identifier's length disagrees with the inserted text.
    #[error("identifier declares length {declared} but text has {actual} characters")]
    LengthMismatch { declared: usize, actual: usize },

    /// Inserting an empty string would create a zero-width node.
    #[error("cannot insert empty text")]
    EmptyInsert,

    /// Inserted text must carry the identifier of a whole span, offset 0.
    #[error("inserted identifier names a fragment: {0:?}")]
    FragmentInsert(Identifier),

    /// The arena index was not handed out by this model.
    #[error("unknown node index: {0:?}")]
    UnknownNode(NodeIndex),
}

/// Result alias for RGASS operations.
pub type Result<T> = std::result::Result<T, RgassError>;
