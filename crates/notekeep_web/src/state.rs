use crate::config::Config;
use notekeep_core::db::{open_db, DbError};
use log::warn;
use notekeep_core::{
    Account, AccountError, Argon2Hasher, Clock, CredentialHasher, NoteService, NoteServiceError,
    SessionToken, SignUp, SqliteAccountRepository, SqliteNoteRepository, SystemClock,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task;

pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Note service bound to one locked connection.
pub type Notes<'a> = NoteService<SqliteNoteRepository<'a>, &'a (dyn Clock + Send + Sync)>;

/// Account directory bound to one locked connection.
pub type Accounts<'a> = SqliteAccountRepository<'a>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub ttl_secs: u64,
    pub cookie_secure: bool,
}

impl SessionSettings {
    pub fn ttl_ms(&self) -> i64 {
        i64::try_from(self.ttl_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }
}

/// Shared handler state.
///
/// Every request locks the connection for its synchronous database work
/// only; the guard never lives across an `.await`. Password hashing runs
/// on the blocking pool with the lock released.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    hasher: Arc<Argon2Hasher>,
    clock: SharedClock,
    pub sessions: SessionSettings,
}

impl AppState {
    pub fn new(
        conn: Connection,
        hasher: Argon2Hasher,
        clock: SharedClock,
        sessions: SessionSettings,
    ) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            hasher: Arc::new(hasher),
            clock,
            sessions,
        }
    }

    /// Opens the configured database with the wall clock.
    pub fn open(config: &Config) -> Result<Self, DbError> {
        let conn = open_db(&config.storage.db_path)?;
        Ok(Self::new(
            conn,
            Argon2Hasher::default(),
            Arc::new(SystemClock),
            SessionSettings {
                ttl_secs: config.sessions.ttl_secs,
                cookie_secure: config.sessions.cookie_secure,
            },
        ))
    }

    /// Runs `op` against the note service.
    pub fn with_notes<T>(
        &self,
        op: impl FnOnce(&Notes<'_>) -> Result<T, NoteServiceError>,
    ) -> Result<T, NoteServiceError> {
        let conn = self.connection();
        let repo = SqliteNoteRepository::try_new(&conn)?;
        let notes = NoteService::new(repo, self.clock.as_ref());
        op(&notes)
    }

    /// Runs `op` against the account directory with the current time.
    pub fn with_accounts<T>(
        &self,
        op: impl FnOnce(&Accounts<'_>, i64) -> Result<T, AccountError>,
    ) -> Result<T, AccountError> {
        let conn = self.connection();
        let accounts = SqliteAccountRepository::try_new(&conn)?;
        op(&accounts, self.clock.now_ms())
    }

    /// Registers an account from sign-up form input.
    pub async fn sign_up(&self, input: &SignUp) -> Result<Account, AccountError> {
        input.validate()?;
        self.with_accounts(|accounts, _| accounts.ensure_username_free(&input.username))?;

        let hasher = Arc::clone(&self.hasher);
        let password = input.password1.clone();
        let password_hash = task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|err| AccountError::Hash(err.to_string()))??;

        self.with_accounts(|accounts, now_ms| {
            accounts.insert_account(&input.username, &password_hash, now_ms)
        })
    }

    /// Verifies credentials and opens a session for the account.
    pub async fn log_in(&self, username: &str, password: &str) -> Result<SessionToken, AccountError> {
        let stored = self.with_accounts(|accounts, _| accounts.find_credentials(username))?;
        let (account, stored_hash) = match stored {
            Some(stored) => (Some(stored.account.id), Some(stored.password_hash)),
            None => (None, None),
        };

        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        let verified = task::spawn_blocking(move || {
            hasher.verify_or_dummy(stored_hash.as_deref(), &password)
        })
        .await
        .map_err(|err| AccountError::Hash(err.to_string()))?;

        let Some(account) = account.filter(|_| verified) else {
            warn!("event=account_login module=web status=rejected");
            return Err(AccountError::InvalidCredentials);
        };
        let ttl_ms = self.sessions.ttl_ms();
        self.with_accounts(|accounts, now_ms| accounts.create_session(account, now_ms, ttl_ms))
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        // Statements are single-shot, so a panicked holder leaves no open transaction.
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
