//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate guard, clock and repository calls into use-case APIs.
//! - Keep the web layer decoupled from storage details.

pub mod note_service;
