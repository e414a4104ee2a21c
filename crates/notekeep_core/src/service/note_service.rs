//! Note use-case service.
//!
//! # Responsibility
//! - Compose the ownership guard with each note operation.
//! - Stamp timestamps from the injected clock.
//! - Force the owner of new notes to the acting account.
//!
//! # Invariants
//! - Authentication is checked before any lookup.
//! - A rejected draft never reaches storage, so `modified_at` is untouched.
//! - A forbidden or missing note is never modified.

use crate::access::guard::{require_authenticated, require_owner, AccessError};
use crate::clock::Clock;
use crate::model::note::{AccountId, Note, NoteDraft, NoteId, NoteValidationError};
use crate::repo::note_repo::NoteRepository;
use crate::repo::RepoError;
use crate::search::query::SearchQuery;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Draft rejected; the form should be shown again.
    Validation(NoteValidationError),
    /// No note with this id.
    NotFound(NoteId),
    /// The note belongs to another account.
    Forbidden(NoteId),
    /// No signed-in account.
    Unauthenticated,
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::Forbidden(id) => write!(f, "access to note {id} is forbidden"),
            Self::Unauthenticated => write!(f, "authentication required"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl NoteServiceError {
    fn from_access(err: AccessError, id: NoteId) -> Self {
        match err {
            AccessError::Unauthenticated => Self::Unauthenticated,
            AccessError::NotFound => Self::NotFound(id),
            AccessError::Forbidden => Self::Forbidden(id),
        }
    }
}

/// Note service facade over a repository and a clock.
pub struct NoteService<R: NoteRepository, C: Clock> {
    repo: R,
    clock: C,
}

impl<R: NoteRepository, C: Clock> NoteService<R, C> {
    pub fn new(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Creates a note owned by `actor`.
    pub fn create_note(
        &self,
        actor: Option<AccountId>,
        draft: &NoteDraft,
    ) -> Result<Note, NoteServiceError> {
        let owner = require_authenticated(actor).map_err(|_| NoteServiceError::Unauthenticated)?;
        let note = self.repo.create_note(owner, draft, self.clock.now_ms())?;
        info!(
            "event=note_create module=service status=ok note_id={} owner_id={owner}",
            note.id
        );
        Ok(note)
    }

    /// Lists `actor`'s notes matching `query`, newest first.
    pub fn list_notes(
        &self,
        actor: Option<AccountId>,
        query: &SearchQuery,
    ) -> Result<Vec<Note>, NoteServiceError> {
        let owner = require_authenticated(actor).map_err(|_| NoteServiceError::Unauthenticated)?;
        let notes = self.repo.list_notes_for_owner(owner, query)?;
        info!(
            "event=note_list module=service status=ok owner_id={owner} terms={} results={}",
            query.terms().len(),
            notes.len()
        );
        Ok(notes)
    }

    /// Returns one note to its owner.
    pub fn note_detail(
        &self,
        actor: Option<AccountId>,
        id: NoteId,
    ) -> Result<Note, NoteServiceError> {
        self.owned_note(actor, id)
    }

    /// Loads a note for the edit form; guarded exactly like `update_note`.
    pub fn prepare_update(
        &self,
        actor: Option<AccountId>,
        id: NoteId,
    ) -> Result<Note, NoteServiceError> {
        self.owned_note(actor, id)
    }

    /// Loads a note for the delete confirmation; guarded exactly like
    /// `delete_note`.
    pub fn prepare_delete(
        &self,
        actor: Option<AccountId>,
        id: NoteId,
    ) -> Result<Note, NoteServiceError> {
        self.owned_note(actor, id)
    }

    /// Replaces title and content of an owned note.
    pub fn update_note(
        &self,
        actor: Option<AccountId>,
        id: NoteId,
        draft: &NoteDraft,
    ) -> Result<Note, NoteServiceError> {
        let note = self.owned_note(actor, id)?;
        let updated = self.repo.update_note(note.id, draft, self.clock.now_ms())?;
        info!(
            "event=note_update module=service status=ok note_id={} owner_id={}",
            updated.id, updated.owner
        );
        Ok(updated)
    }

    /// Removes an owned note.
    pub fn delete_note(&self, actor: Option<AccountId>, id: NoteId) -> Result<(), NoteServiceError> {
        let note = self.owned_note(actor, id)?;
        self.repo.delete_note(note.id)?;
        info!(
            "event=note_delete module=service status=ok note_id={} owner_id={}",
            note.id, note.owner
        );
        Ok(())
    }

    fn owned_note(&self, actor: Option<AccountId>, id: NoteId) -> Result<Note, NoteServiceError> {
        let actor = require_authenticated(actor).map_err(|_| NoteServiceError::Unauthenticated)?;
        let found = self.repo.get_note(id)?;
        require_owner(Some(actor), found).map_err(|err| {
            if err == AccessError::Forbidden {
                warn!(
                    "event=note_access module=service status=forbidden note_id={id} actor_id={actor}"
                );
            }
            NoteServiceError::from_access(err, id)
        })
    }
}
