//! Type definitions for the RGASS CRDT.
//!
//! This module contains the fundamental types used throughout the crate,
//! organized into focused submodules.

pub mod clock;
pub mod identifier;
pub mod replica;
pub mod timestamp;

pub use clock::LamportClock;
pub use identifier::Identifier;
pub use replica::{SessionId, SiteId};
pub use timestamp::LamportTimestamp;
