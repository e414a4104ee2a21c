//! Session cookie handling and per-request identity.
//!
//! # Invariants
//! - The acting account is resolved once per request, from the cookie only.
//! - Redirect targets taken from user input are local paths.

use crate::error::WebError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use notekeep_core::{require_authenticated, AccountId, NoteServiceError};

pub const SESSION_COOKIE: &str = "notekeep_session";
pub const LOGIN_PATH: &str = "/login/";

/// Who is asking, and for which path.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub actor: Option<AccountId>,
    /// Path and query of the request, used as the post-login target.
    pub path: String,
}

impl RequestContext {
    /// Requires a signed-in account, redirecting anonymous visitors to login.
    pub fn require_login(&self) -> Result<AccountId, WebError> {
        require_authenticated(self.actor).map_err(|_| WebError::LoginRequired {
            next: self.path.clone(),
        })
    }

    /// Maps a note use-case failure to the response it deserves here.
    pub fn reject(&self, err: NoteServiceError) -> WebError {
        match err {
            NoteServiceError::Unauthenticated => WebError::LoginRequired {
                next: self.path.clone(),
            },
            NoteServiceError::NotFound(_) => WebError::NotFound,
            NoteServiceError::Forbidden(_) => WebError::Forbidden,
            NoteServiceError::Validation(err) => WebError::Internal(err.to_string()),
            NoteServiceError::Repo(err) => WebError::Internal(err.to_string()),
        }
    }
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let path = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string());

        let actor = match session_token(&parts.headers) {
            Some(token) => state
                .with_accounts(|accounts, now_ms| accounts.resolve_session(&token, now_ms))?,
            None => None,
        };

        Ok(Self { actor, path })
    }
}

/// Extracts the session token from any `Cookie` header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie(token: &str, max_age_secs: u64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; Max-Age={max_age_secs}; HttpOnly; SameSite=Lax"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn expired_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

/// Login page URL that returns to `next` afterwards.
pub fn login_redirect(next: &str) -> String {
    format!("{LOGIN_PATH}?next={}", urlencoding::encode(next))
}

/// Returns `next` when it is a local absolute path, otherwise `/`.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::{login_redirect, safe_next, session_cookie, session_token};
    use axum::http::header::COOKIE;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn token_is_found_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            COOKIE,
            HeaderValue::from_static("csrftoken=x; notekeep_session=abc123; lang=en"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn empty_or_missing_token_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);
        headers.insert(COOKIE, HeaderValue::from_static("notekeep_session="));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn cookie_attributes() {
        assert_eq!(
            session_cookie("t", 60, false),
            "notekeep_session=t; Path=/; Max-Age=60; HttpOnly; SameSite=Lax"
        );
        assert!(session_cookie("t", 60, true).ends_with("; Secure"));
    }

    #[test]
    fn login_redirect_encodes_next() {
        assert_eq!(login_redirect("/5/update/"), "/login/?next=%2F5%2Fupdate%2F");
        assert_eq!(login_redirect("/?q=a b"), "/login/?next=%2F%3Fq%3Da%20b");
    }

    #[test]
    fn only_local_next_is_followed() {
        assert_eq!(safe_next(Some("/5/")), "/5/");
        assert_eq!(safe_next(Some("https://evil.example/")), "/");
        assert_eq!(safe_next(Some("//evil.example/")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
