//! JSON view models rendered by the handlers.

use notekeep_core::{AccountError, Note, NoteDraft, NoteId, NoteValidationError};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Offending form field; `None` for form-wide errors.
    pub field: Option<&'static str>,
    pub message: String,
}

impl From<&NoteValidationError> for FieldError {
    fn from(err: &NoteValidationError) -> Self {
        Self {
            field: Some(err.field()),
            message: err.to_string(),
        }
    }
}

impl From<&AccountError> for FieldError {
    fn from(err: &AccountError) -> Self {
        Self {
            field: err.field(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NoteSummary {
    pub id: NoteId,
    pub title: String,
    pub preview: String,
    pub created_at: i64,
    pub modified_at: i64,
    pub url: String,
}

impl From<Note> for NoteSummary {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            preview: note.preview(),
            url: note.detail_path(),
            title: note.title,
            created_at: note.created_at,
            modified_at: note.modified_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NoteListView {
    /// Raw search text echoed back, empty when unfiltered.
    pub query: String,
    pub notes: Vec<NoteSummary>,
}

#[derive(Debug, Serialize)]
pub struct NoteDetailView {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub created_at: i64,
    pub modified_at: i64,
    pub update_url: String,
    pub delete_url: String,
}

impl From<Note> for NoteDetailView {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            update_url: format!("/{}/update/", note.id),
            delete_url: format!("/{}/delete/", note.id),
            title: note.title,
            content: note.content,
            created_at: note.created_at,
            modified_at: note.modified_at,
        }
    }
}

/// Create or update form, empty, prefilled or echoing a rejected draft.
#[derive(Debug, Serialize)]
pub struct NoteFormView {
    pub action: String,
    pub title: String,
    pub content: String,
    pub errors: Vec<FieldError>,
}

impl NoteFormView {
    pub fn empty(action: impl Into<String>) -> Self {
        Self::from_draft(action, NoteDraft::default(), Vec::new())
    }

    pub fn from_draft(action: impl Into<String>, draft: NoteDraft, errors: Vec<FieldError>) -> Self {
        Self {
            action: action.into(),
            title: draft.title,
            content: draft.content,
            errors,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteConfirmView {
    pub id: NoteId,
    pub title: String,
    pub action: String,
}

impl From<Note> for DeleteConfirmView {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            action: format!("/{}/delete/", note.id),
            title: note.title,
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct SignUpView {
    pub username: String,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Default, Serialize)]
pub struct LoginView {
    pub username: String,
    pub next: Option<String>,
    pub errors: Vec<FieldError>,
}

#[cfg(test)]
mod tests {
    use super::{FieldError, NoteDetailView, NoteSummary};
    use notekeep_core::{Note, NoteDraft};

    fn note(content: &str) -> Note {
        Note {
            id: 7,
            owner: 1,
            title: "Groceries".to_string(),
            content: content.to_string(),
            created_at: 10,
            modified_at: 20,
        }
    }

    #[test]
    fn summary_carries_preview_and_url() {
        let summary = NoteSummary::from(note(&"x".repeat(200)));
        assert_eq!(summary.url, "/7/");
        assert_eq!(summary.preview.chars().count(), 180);
        assert!(summary.preview.ends_with("..."));
    }

    #[test]
    fn detail_links_to_its_forms() {
        let view = NoteDetailView::from(note("milk"));
        assert_eq!(view.update_url, "/7/update/");
        assert_eq!(view.delete_url, "/7/delete/");
        assert_eq!(view.content, "milk");
    }

    #[test]
    fn validation_error_points_at_title() {
        let err = NoteDraft::new("", "").validate().unwrap_err();
        let field = FieldError::from(&err);
        assert_eq!(field.field, Some("title"));
    }
}
