//! Title search for owner-scoped note listings.
//!
//! # Responsibility
//! - Normalize raw query strings into search terms.
//! - Decide whether a title matches; storage only supplies the candidates.

pub mod query;
