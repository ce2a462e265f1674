//! Peer CRDT primitives.
//!
//! Small state-based CRDTs that live alongside the text document: sites ship
//! their whole state and receivers merge it. None of them depend on the RGASS
//! core beyond the shared site and timestamp types.

pub mod gcounter;
pub mod lww_register;
pub mod pncounter;

pub use gcounter::GCounter;
pub use lww_register::LwwRegister;
pub use pncounter::PnCounter;
