//! Ownership guard shared by detail, update and delete.
//!
//! # Responsibility
//! - Classify an (actor, note) pair into one access outcome.
//! - Offer `Result` helpers so handlers compose the check with `?`.
//!
//! # Invariants
//! - Checks run in a fixed order: authentication, existence, ownership.
//! - A non-owner learns that the note exists (403 rather than 404).

use crate::model::note::{AccountId, Note};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Outcome of checking one actor against one looked-up note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Unauthenticated,
    NotFound,
    Forbidden,
    Allowed,
}

/// Denied access, as surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    Unauthenticated,
    NotFound,
    Forbidden,
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "authentication required"),
            Self::NotFound => write!(f, "note not found"),
            Self::Forbidden => write!(f, "note belongs to another account"),
        }
    }
}

impl Error for AccessError {}

/// Classifies access of `actor` to the looked-up `note`.
pub fn authorize(actor: Option<AccountId>, note: Option<&Note>) -> AccessDecision {
    let Some(actor) = actor else {
        return AccessDecision::Unauthenticated;
    };
    let Some(note) = note else {
        return AccessDecision::NotFound;
    };

    if note.owner == actor {
        AccessDecision::Allowed
    } else {
        AccessDecision::Forbidden
    }
}

/// Requires a signed-in actor.
pub fn require_authenticated(actor: Option<AccountId>) -> Result<AccountId, AccessError> {
    actor.ok_or(AccessError::Unauthenticated)
}

/// Requires `actor` to own `note`, handing the note back on success.
pub fn require_owner(actor: Option<AccountId>, note: Option<Note>) -> Result<Note, AccessError> {
    match authorize(actor, note.as_ref()) {
        AccessDecision::Unauthenticated => Err(AccessError::Unauthenticated),
        AccessDecision::NotFound => Err(AccessError::NotFound),
        AccessDecision::Forbidden => Err(AccessError::Forbidden),
        AccessDecision::Allowed => note.ok_or(AccessError::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::{authorize, require_authenticated, require_owner, AccessDecision, AccessError};
    use crate::model::note::Note;

    fn note_owned_by(owner: i64) -> Note {
        Note {
            id: 1,
            owner,
            title: "t".to_string(),
            content: String::new(),
            created_at: 0,
            modified_at: 0,
        }
    }

    #[test]
    fn unauthenticated_wins_over_every_other_outcome() {
        let note = note_owned_by(1);
        assert_eq!(authorize(None, Some(&note)), AccessDecision::Unauthenticated);
        assert_eq!(authorize(None, None), AccessDecision::Unauthenticated);
    }

    #[test]
    fn missing_note_is_not_found_for_signed_in_actor() {
        assert_eq!(authorize(Some(1), None), AccessDecision::NotFound);
    }

    #[test]
    fn owner_is_allowed_and_others_are_forbidden() {
        let note = note_owned_by(1);
        assert_eq!(authorize(Some(1), Some(&note)), AccessDecision::Allowed);
        assert_eq!(authorize(Some(2), Some(&note)), AccessDecision::Forbidden);
    }

    #[test]
    fn require_owner_returns_note_or_error() {
        let note = note_owned_by(3);
        assert_eq!(require_owner(Some(3), Some(note.clone())), Ok(note.clone()));
        assert_eq!(
            require_owner(Some(4), Some(note)),
            Err(AccessError::Forbidden)
        );
        assert_eq!(require_owner(Some(4), None), Err(AccessError::NotFound));
    }

    #[test]
    fn require_authenticated_maps_missing_actor() {
        assert_eq!(require_authenticated(Some(9)), Ok(9));
        assert_eq!(require_authenticated(None), Err(AccessError::Unauthenticated));
    }
}
