//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist notes with lookup by id and by owner.
//! - Apply the owner scope and list ordering in SQL, title search in Rust.
//!
//! # Invariants
//! - Every mutation is a single statement; no multi-row transactions.
//! - Owner listings are ordered by `created_at DESC, id ASC`.
//! - `update_note` never touches `owner_id` or `created_at`.

use crate::model::note::{AccountId, Note, NoteDraft, NoteId};
use crate::repo::{ensure_columns, RepoError, RepoResult};
use crate::search::query::SearchQuery;
use rusqlite::{params, Connection, OptionalExtension, Row};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    title,
    content,
    created_at,
    modified_at
FROM notes";

const NOTE_COLUMNS: &[&str] = &[
    "id",
    "owner_id",
    "title",
    "content",
    "created_at",
    "modified_at",
];

/// Repository interface for note storage.
pub trait NoteRepository {
    /// Trims and validates `draft`, then inserts it with
    /// `created_at = modified_at = now_ms`.
    fn create_note(&self, owner: AccountId, draft: &NoteDraft, now_ms: i64) -> RepoResult<Note>;
    /// Gets one note by id.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Trims and validates `draft`, replaces title/content and stamps `modified_at`.
    fn update_note(&self, id: NoteId, draft: &NoteDraft, now_ms: i64) -> RepoResult<Note>;
    /// Removes one note; `NotFound` when it is already gone.
    fn delete_note(&self, id: NoteId) -> RepoResult<()>;
    /// Lists the owner's notes matching `query`, newest first.
    fn list_notes_for_owner(&self, owner: AccountId, query: &SearchQuery)
        -> RepoResult<Vec<Note>>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the schema is
    ///   not the one this binary expects.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_columns(conn, "notes", NOTE_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&self, owner: AccountId, draft: &NoteDraft, now_ms: i64) -> RepoResult<Note> {
        let draft = draft.trimmed();
        draft.validate()?;

        self.conn.execute(
            "INSERT INTO notes (
                owner_id,
                title,
                content,
                created_at,
                modified_at
            ) VALUES (?1, ?2, ?3, ?4, ?4);",
            params![owner, draft.title.as_str(), draft.content.as_str(), now_ms],
        )?;

        let id = self.conn.last_insert_rowid();
        self.get_note(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("note {id} missing right after insert"))
        })
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let note = self
            .conn
            .query_row(
                &format!("{NOTE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_note_row,
            )
            .optional()?;
        Ok(note)
    }

    fn update_note(&self, id: NoteId, draft: &NoteDraft, now_ms: i64) -> RepoResult<Note> {
        let draft = draft.trimmed();
        draft.validate()?;

        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = ?2,
                content = ?3,
                modified_at = ?4
             WHERE id = ?1;",
            params![id, draft.title.as_str(), draft.content.as_str(), now_ms],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        self.get_note(id)?.ok_or(RepoError::NotFound(id))
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn list_notes_for_owner(
        &self,
        owner: AccountId,
        query: &SearchQuery,
    ) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL}
             WHERE owner_id = ?1
             ORDER BY created_at DESC, id ASC;"
        ))?;

        let mut rows = stmt.query([owner])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            let note = parse_note_row(row)?;
            if query.matches_title(&note.title) {
                notes.push(note);
            }
        }

        Ok(notes)
    }
}

fn parse_note_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get("id")?,
        owner: row.get("owner_id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        modified_at: row.get("modified_at")?,
    })
}
