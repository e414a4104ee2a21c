//! Core domain logic for notekeep.
//! This crate is the single source of truth for note ownership and search rules.

pub mod access;
pub mod accounts;
pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use access::guard::{authorize, require_authenticated, require_owner, AccessDecision, AccessError};
pub use accounts::account_repo::{
    Account, SessionToken, SignUp, SqliteAccountRepository, StoredCredentials,
};
pub use accounts::password::{Argon2Hasher, CredentialHasher};
pub use accounts::AccountError;
pub use clock::{Clock, ManualClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings, LoggingError};
pub use model::note::{
    content_preview, AccountId, Note, NoteDraft, NoteId, NoteValidationError, TITLE_MAX_CHARS,
};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::{RepoError, RepoResult};
pub use search::query::SearchQuery;
pub use service::note_service::{NoteService, NoteServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
