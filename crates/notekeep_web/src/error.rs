use crate::session::login_redirect;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use log::error;
use notekeep_core::{AccountError, RepoError};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Request failure that ends the handler.
///
/// Form validation never lands here; handlers answer it with a form view.
#[derive(Debug)]
pub enum WebError {
    /// Anonymous request to a protected page; redirects to login.
    LoginRequired { next: String },
    NotFound,
    Forbidden,
    /// Persistence or hashing failure; logged, answered generically.
    Internal(String),
}

impl Display for WebError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoginRequired { next } => write!(f, "login required for `{next}`"),
            Self::NotFound => write!(f, "not found"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl Error for WebError {}

impl From<AccountError> for WebError {
    fn from(value: AccountError) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<RepoError> for WebError {
    fn from(value: RepoError) -> Self {
        Self::Internal(value.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error_code: &'static str,
    message: &'static str,
}

fn error_body(status: StatusCode, error_code: &'static str, message: &'static str) -> Response {
    (status, Json(ErrorBody { error_code, message })).into_response()
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            Self::LoginRequired { next } => Redirect::to(&login_redirect(&next)).into_response(),
            Self::NotFound => error_body(StatusCode::NOT_FOUND, "not_found", "Not found."),
            Self::Forbidden => error_body(
                StatusCode::FORBIDDEN,
                "forbidden",
                "You do not have permission to access this note.",
            ),
            Self::Internal(message) => {
                error!("event=request_failed module=web status=error error={message}");
                error_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Something went wrong.",
                )
            }
        }
    }
}
