//! CRDT (Conflict-free Replicated Data Type) implementation module.
//!
//! This module contains the RGASS (Replicated Growable Array Supporting
//! Strings) CRDT and all its supporting types and structures.

pub mod error;
pub mod model;
pub mod node;
pub mod operation;
pub mod rgass;
pub mod types;

// Re-export the main public API
pub use error::{Result, RgassError};
pub use model::{Model, Traverse};
pub use node::{Node, NodeIndex, SplitShape};
pub use operation::{DeleteOperation, InsertOperation, Operation};
pub use rgass::{DeleteOutcome, Rgass};
pub use types::{Identifier, LamportClock, LamportTimestamp, SessionId, SiteId};
