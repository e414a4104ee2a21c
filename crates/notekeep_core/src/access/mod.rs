//! Access control for note operations.

pub mod guard;
