//! SQLite-backed account and session storage.
//!
//! # Invariants
//! - Usernames are unique and compared case-sensitively.
//! - Expired sessions never resolve to an account.

use crate::accounts::AccountError;
use crate::model::note::AccountId;
use crate::repo::ensure_columns;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;
use uuid::Uuid;

pub const USERNAME_MAX_CHARS: usize = 150;
pub const PASSWORD_MIN_CHARS: usize = 8;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));

/// Registered account, without its credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub created_at: i64,
}

/// Sign-up form input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignUp {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl SignUp {
    pub fn new(
        username: impl Into<String>,
        password1: impl Into<String>,
        password2: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password1: password1.into(),
            password2: password2.into(),
        }
    }

    /// Checks username shape and password rules; storage checks uniqueness.
    pub fn validate(&self) -> Result<(), AccountError> {
        let username_chars = self.username.chars().count();
        if username_chars == 0
            || username_chars > USERNAME_MAX_CHARS
            || !USERNAME_RE.is_match(&self.username)
        {
            return Err(AccountError::UsernameInvalid);
        }
        if self.password1 != self.password2 {
            return Err(AccountError::PasswordMismatch);
        }
        if self.password1.chars().count() < PASSWORD_MIN_CHARS {
            return Err(AccountError::PasswordTooShort {
                min: PASSWORD_MIN_CHARS,
            });
        }
        if self.password1.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(AccountError::PasswordNumeric);
        }
        Ok(())
    }
}

/// Opaque session token handed to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An account together with its stored password hash.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub account: Account,
    pub password_hash: String,
}

/// Account directory over one SQLite connection.
///
/// Holds no hasher: callers hash and verify passwords outside whatever
/// lock guards the connection.
pub struct SqliteAccountRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAccountRepository<'conn> {
    /// Constructs a directory from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> Result<Self, AccountError> {
        ensure_columns(conn, "accounts", &["id", "username", "password_hash", "created_at"])?;
        ensure_columns(
            conn,
            "sessions",
            &["token", "account_id", "created_at", "expires_at"],
        )?;
        Ok(Self { conn })
    }

    /// Fails with `UsernameTaken` when `username` is already registered.
    pub fn ensure_username_free(&self, username: &str) -> Result<(), AccountError> {
        if self.find_id_by_username(username)?.is_some() {
            return Err(AccountError::UsernameTaken);
        }
        Ok(())
    }

    /// Stores a new account with an already computed password hash.
    ///
    /// # Errors
    /// - `UsernameTaken` when the username was registered in the meantime.
    pub fn insert_account(
        &self,
        username: &str,
        password_hash: &str,
        now_ms: i64,
    ) -> Result<Account, AccountError> {
        let inserted = self.conn.execute(
            "INSERT INTO accounts (username, password_hash, created_at)
             VALUES (?1, ?2, ?3);",
            params![username, password_hash, now_ms],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                return Err(AccountError::UsernameTaken);
            }
            Err(err) => return Err(err.into()),
        }

        let id = self.conn.last_insert_rowid();
        info!("event=account_sign_up module=accounts status=ok account_id={id}");
        Ok(Account {
            id,
            username: username.to_string(),
            created_at: now_ms,
        })
    }

    /// Looks up the account and hash registered under `username`.
    pub fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, AccountError> {
        let credentials = self
            .conn
            .query_row(
                "SELECT id, username, password_hash, created_at
                 FROM accounts
                 WHERE username = ?1;",
                [username],
                |row| {
                    Ok(StoredCredentials {
                        account: Account {
                            id: row.get("id")?,
                            username: row.get("username")?,
                            created_at: row.get("created_at")?,
                        },
                        password_hash: row.get("password_hash")?,
                    })
                },
            )
            .optional()?;
        Ok(credentials)
    }

    /// Gets one account by id.
    pub fn get_account(&self, id: AccountId) -> Result<Option<Account>, AccountError> {
        let account = self
            .conn
            .query_row(
                "SELECT id, username, created_at FROM accounts WHERE id = ?1;",
                [id],
                |row| {
                    Ok(Account {
                        id: row.get("id")?,
                        username: row.get("username")?,
                        created_at: row.get("created_at")?,
                    })
                },
            )
            .optional()?;
        Ok(account)
    }

    /// Issues a session for `account` valid for `ttl_ms` from `now_ms`.
    pub fn create_session(
        &self,
        account: AccountId,
        now_ms: i64,
        ttl_ms: i64,
    ) -> Result<SessionToken, AccountError> {
        let purged = self.purge_expired_sessions(now_ms)?;
        let token = SessionToken::generate();
        self.conn.execute(
            "INSERT INTO sessions (token, account_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![token.as_str(), account, now_ms, now_ms.saturating_add(ttl_ms)],
        )?;
        info!(
            "event=session_create module=accounts status=ok account_id={account} purged={purged}"
        );
        Ok(token)
    }

    /// Resolves a live session to its account.
    pub fn resolve_session(
        &self,
        token: &str,
        now_ms: i64,
    ) -> Result<Option<AccountId>, AccountError> {
        let account = self
            .conn
            .query_row(
                "SELECT account_id
                 FROM sessions
                 WHERE token = ?1
                   AND expires_at > ?2;",
                params![token, now_ms],
                |row| row.get(0),
            )
            .optional()?;
        Ok(account)
    }

    /// Revokes one session; unknown tokens are ignored.
    pub fn delete_session(&self, token: &str) -> Result<(), AccountError> {
        self.conn
            .execute("DELETE FROM sessions WHERE token = ?1;", [token])?;
        Ok(())
    }

    /// Drops every session expired at `now_ms`, returning how many.
    pub fn purge_expired_sessions(&self, now_ms: i64) -> Result<usize, AccountError> {
        let removed = self
            .conn
            .execute("DELETE FROM sessions WHERE expires_at <= ?1;", [now_ms])?;
        Ok(removed)
    }

    fn find_id_by_username(&self, username: &str) -> Result<Option<AccountId>, AccountError> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM accounts WHERE username = ?1;",
                [username],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }
}
