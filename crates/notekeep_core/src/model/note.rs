//! Note domain model.
//!
//! # Responsibility
//! - Define the persisted `Note` shape and the `NoteDraft` write input.
//! - Validate title bounds before anything reaches storage.
//! - Derive the compact content preview used by list views.
//!
//! # Invariants
//! - `owner` and `created_at` never change after insertion.
//! - `modified_at` is refreshed on every successful update.
//! - Title length is counted in characters, not bytes.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned note identifier.
pub type NoteId = i64;

/// Opaque identifier of the account that owns a note.
pub type AccountId = i64;

/// Maximum title length in characters.
pub const TITLE_MAX_CHARS: usize = 140;

/// Content longer than this many characters is truncated in previews.
pub const PREVIEW_MAX_CHARS: usize = 180;

const PREVIEW_ELLIPSIS: &str = "...";

/// Persisted note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub owner: AccountId,
    pub title: String,
    /// Free text; empty when the author left it blank.
    pub content: String,
    /// Unix epoch milliseconds, set once at insertion.
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed by every update.
    pub modified_at: i64,
}

impl Note {
    /// Returns the compact preview of this note's content.
    pub fn preview(&self) -> String {
        content_preview(&self.content)
    }

    /// Canonical path of this note's detail page.
    pub fn detail_path(&self) -> String {
        detail_path(self.id)
    }
}

impl Display for Note {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// Detail page path for a note id.
pub fn detail_path(id: NoteId) -> String {
    format!("/{id}/")
}

/// Derives the preview for arbitrary content.
///
/// Content of at most 180 characters is returned unchanged. Longer content
/// keeps its first 177 characters followed by `...`, so the preview is
/// always exactly 180 characters in that case.
pub fn content_preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_MAX_CHARS {
        return content.to_string();
    }

    let keep = PREVIEW_MAX_CHARS - PREVIEW_ELLIPSIS.chars().count();
    let mut preview: String = content.chars().take(keep).collect();
    preview.push_str(PREVIEW_ELLIPSIS);
    preview
}

/// Write-side input for create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Copy with leading and trailing whitespace stripped from both fields.
    pub fn trimmed(&self) -> Self {
        Self::new(self.title.trim(), self.content.trim())
    }

    /// Checks the draft as it will be stored, i.e. after trimming.
    ///
    /// # Errors
    /// - `EmptyTitle` when the title is empty or whitespace only.
    /// - `TitleTooLong` when the trimmed title exceeds [`TITLE_MAX_CHARS`].
    /// - `NullCharacter` when either field contains `\0`.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(NoteValidationError::EmptyTitle);
        }
        if title.contains('\0') {
            return Err(NoteValidationError::NullCharacter { field: "title" });
        }
        if self.content.contains('\0') {
            return Err(NoteValidationError::NullCharacter { field: "content" });
        }

        let actual = title.chars().count();
        if actual > TITLE_MAX_CHARS {
            return Err(NoteValidationError::TitleTooLong {
                max: TITLE_MAX_CHARS,
                actual,
            });
        }

        Ok(())
    }
}

/// Draft validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyTitle,
    TitleTooLong { max: usize, actual: usize },
    /// Text containing `\0`, which SQLite length checks cannot count.
    NullCharacter { field: &'static str },
}

impl NoteValidationError {
    /// Form field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyTitle | Self::TitleTooLong { .. } => "title",
            Self::NullCharacter { field } => *field,
        }
    }
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title is required"),
            Self::TitleTooLong { max, actual } => write!(
                f,
                "title must be at most {max} characters (it has {actual})"
            ),
            Self::NullCharacter { .. } => write!(f, "null characters are not allowed"),
        }
    }
}

impl Error for NoteValidationError {}
