//! Account directory: identities, credentials and sessions.
//!
//! # Responsibility
//! - Register accounts and verify their passwords.
//! - Issue, resolve and revoke session tokens.
//!
//! # Invariants
//! - Plain-text passwords are never stored or logged.
//! - The note core sees only the resulting `AccountId`.

use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod account_repo;
pub mod password;

/// Account directory failures.
#[derive(Debug)]
pub enum AccountError {
    UsernameInvalid,
    UsernameTaken,
    PasswordMismatch,
    PasswordTooShort { min: usize },
    PasswordNumeric,
    InvalidCredentials,
    Hash(String),
    Repo(RepoError),
}

impl AccountError {
    /// Form field the error belongs to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::UsernameInvalid | Self::UsernameTaken => Some("username"),
            Self::PasswordMismatch => Some("password2"),
            Self::PasswordTooShort { .. } | Self::PasswordNumeric => Some("password1"),
            Self::InvalidCredentials | Self::Hash(_) | Self::Repo(_) => None,
        }
    }

    /// Whether the caller should re-render its form instead of failing.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::Hash(_) | Self::Repo(_))
    }
}

impl Display for AccountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UsernameInvalid => write!(
                f,
                "enter a username of at most 150 letters, digits and @/./+/-/_ characters"
            ),
            Self::UsernameTaken => write!(f, "a user with that username already exists"),
            Self::PasswordMismatch => write!(f, "the two password fields didn't match"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must contain at least {min} characters")
            }
            Self::PasswordNumeric => write!(f, "password can't be entirely numeric"),
            Self::InvalidCredentials => write!(f, "please enter a correct username and password"),
            Self::Hash(message) => write!(f, "password hashing failed: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AccountError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for AccountError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}
