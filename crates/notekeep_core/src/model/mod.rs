//! Domain model for owner-scoped notes.
//!
//! # Responsibility
//! - Define the canonical note record and its write-side draft.
//! - Keep pure derivations (preview, detail path) next to the data.
//!
//! # Invariants
//! - Every note has exactly one owner, fixed at creation.
//! - Deletion is a hard delete; there are no tombstones.

pub mod note;
