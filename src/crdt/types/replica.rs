//! Site and session identifier types.
//!
//! Assigning these is the job of whatever layer hands out identities to
//! collaborators; the CRDTs only require that they are unique.

/// A unique identifier for each site (collaborator) editing a document.
///
/// Two sites editing the same document must never share a `SiteId`, otherwise
/// identifiers they generate could collide.
pub type SiteId = u64;

/// Identifies an editing session (a document epoch shared by all sites).
///
/// It is the most significant component of an [`Identifier`](super::Identifier)
/// ordering, so all sites of one document are expected to use the same value.
pub type SessionId = u64;
