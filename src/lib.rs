//! # RGASS CRDT - Replicated Growable Array Supporting Strings
//!
//! A Conflict-free Replicated Data Type (CRDT) for collaborative plain-text
//! editing. Inserted strings stay whole nodes until an edit has to cut into
//! them, so a document is a short list of spans rather than one entry per
//! character.
//!
//! ## Features
//!
//! - **Conflict-free**: replicas applying the same operations in any causal
//!   order end with the same text
//! - **Span-addressed**: remote operations name the span they were made
//!   against and are re-resolved through any local splits
//! - **Tombstone-based deletion**: deleted text stays addressable
//! - **Peer CRDTs**: counters and a last-writer-wins register in [`primitives`]
//!
//! ## Example
//!
//! ```rust
//! use crdt_rgass::Site;
//!
//! let (alice, mut to_bob) = Site::new(1, 1);
//! let (bob, _to_alice) = Site::new(1, 2);
//!
//! alice.insert(0, "Hello").unwrap();
//! bob.receive(&to_bob.try_recv().unwrap()).unwrap();
//! assert_eq!(bob.text(), "Hello");
//! ```

pub mod crdt;
pub mod primitives;
pub mod server;
pub mod site;

// Re-export the main public API from the CRDT module
pub use crdt::{DeleteOperation, InsertOperation, Operation};
pub use crdt::{Identifier, LamportClock, LamportTimestamp, SessionId, SiteId};
pub use crdt::{Model, Node, Rgass, RgassError};
pub use site::{Site, SiteError};
