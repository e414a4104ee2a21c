use crate::error::WebError;
use crate::session::{
    expired_session_cookie, safe_next, session_cookie, session_token, RequestContext, LOGIN_PATH,
};
use crate::state::AppState;
use crate::views::{
    DeleteConfirmView, FieldError, LoginView, NoteDetailView, NoteFormView, NoteListView,
    NoteSummary, SignUpView,
};
use axum::extract::rejection::FormRejection;
use axum::extract::{Path, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use log::info;
use notekeep_core::{NoteDraft, NoteId, NoteServiceError, SearchQuery, SignUp};
use serde::Deserialize;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", get(list_notes))
        .route("/notes/", get(list_notes))
        .route("/create/", get(create_form).post(create_note))
        .route("/notes/create/", get(create_form).post(create_note))
        .route("/{id}/", get(note_detail))
        .route("/{id}/update/", get(update_form).post(update_note))
        .route("/{id}/delete/", get(delete_confirm).post(delete_note))
        .route("/sign-up/", get(sign_up_form).post(sign_up))
        .route("/login/", get(login_form).post(login))
        .route("/logout/", post(logout))
        .fallback(not_found)
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn not_found() -> WebError {
    WebError::NotFound
}

/// Query string as raw pairs; repeated or unknown keys never reject a request.
type QueryPairs = Query<Vec<(String, String)>>;

/// Last value given for `name`, if any.
fn last_param<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

async fn list_notes(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(pairs): QueryPairs,
) -> Result<Json<NoteListView>, WebError> {
    let raw = last_param(&pairs, "q")
        .or_else(|| last_param(&pairs, "search"))
        .unwrap_or_default();
    let query = SearchQuery::parse(Some(raw));
    let notes = state
        .with_notes(|notes| notes.list_notes(ctx.actor, &query))
        .map_err(|err| ctx.reject(err))?;

    Ok(Json(NoteListView {
        query: raw.trim().to_string(),
        notes: notes.into_iter().map(NoteSummary::from).collect(),
    }))
}

async fn create_form(ctx: RequestContext) -> Result<Json<NoteFormView>, WebError> {
    ctx.require_login()?;
    Ok(Json(NoteFormView::empty(ctx.path)))
}

async fn create_note(
    State(state): State<AppState>,
    ctx: RequestContext,
    form: Result<Form<NoteDraft>, FormRejection>,
) -> Result<Response, WebError> {
    ctx.require_login()?;
    let Form(draft) = match form {
        Ok(form) => form,
        Err(rejection) => return Ok(rejection.into_response()),
    };
    match state.with_notes(|notes| notes.create_note(ctx.actor, &draft)) {
        Ok(note) => Ok(Redirect::to(&note.detail_path()).into_response()),
        Err(NoteServiceError::Validation(err)) => {
            Ok(rejected_form(ctx.path, draft, FieldError::from(&err)))
        }
        Err(err) => Err(ctx.reject(err)),
    }
}

async fn note_detail(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(raw_id): Path<String>,
) -> Result<Json<NoteDetailView>, WebError> {
    let id = parse_note_id(&raw_id)?;
    let note = state
        .with_notes(|notes| notes.note_detail(ctx.actor, id))
        .map_err(|err| ctx.reject(err))?;
    Ok(Json(note.into()))
}

async fn update_form(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(raw_id): Path<String>,
) -> Result<Json<NoteFormView>, WebError> {
    let id = parse_note_id(&raw_id)?;
    let note = state
        .with_notes(|notes| notes.prepare_update(ctx.actor, id))
        .map_err(|err| ctx.reject(err))?;
    Ok(Json(NoteFormView::from_draft(
        ctx.path,
        NoteDraft::new(note.title, note.content),
        Vec::new(),
    )))
}

async fn update_note(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(raw_id): Path<String>,
    form: Result<Form<NoteDraft>, FormRejection>,
) -> Result<Response, WebError> {
    let id = parse_note_id(&raw_id)?;
    ctx.require_login()?;
    let Form(draft) = match form {
        Ok(form) => form,
        Err(rejection) => return Ok(rejection.into_response()),
    };
    match state.with_notes(|notes| notes.update_note(ctx.actor, id, &draft)) {
        Ok(note) => Ok(Redirect::to(&note.detail_path()).into_response()),
        Err(NoteServiceError::Validation(err)) => {
            Ok(rejected_form(ctx.path, draft, FieldError::from(&err)))
        }
        Err(err) => Err(ctx.reject(err)),
    }
}

async fn delete_confirm(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(raw_id): Path<String>,
) -> Result<Json<DeleteConfirmView>, WebError> {
    let id = parse_note_id(&raw_id)?;
    let note = state
        .with_notes(|notes| notes.prepare_delete(ctx.actor, id))
        .map_err(|err| ctx.reject(err))?;
    Ok(Json(note.into()))
}

async fn delete_note(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(raw_id): Path<String>,
) -> Result<Redirect, WebError> {
    let id = parse_note_id(&raw_id)?;
    state
        .with_notes(|notes| notes.delete_note(ctx.actor, id))
        .map_err(|err| ctx.reject(err))?;
    Ok(Redirect::to("/"))
}

async fn sign_up_form() -> Json<SignUpView> {
    Json(SignUpView::default())
}

async fn sign_up(
    State(state): State<AppState>,
    Form(input): Form<SignUp>,
) -> Result<Response, WebError> {
    match state.sign_up(&input).await {
        Ok(_) => Ok(Redirect::to(LOGIN_PATH).into_response()),
        Err(err) if err.is_user_error() => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(SignUpView {
                username: input.username,
                errors: vec![FieldError::from(&err)],
            }),
        )
            .into_response()),
        Err(err) => Err(err.into()),
    }
}

#[derive(Debug, Default, Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    next: Option<String>,
}

async fn login_form(Query(pairs): QueryPairs) -> Json<LoginView> {
    Json(LoginView {
        next: last_param(&pairs, "next").map(str::to_string),
        ..LoginView::default()
    })
}

async fn login(
    State(state): State<AppState>,
    Query(pairs): QueryPairs,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    let settings = state.sessions;
    let outcome = state.log_in(&form.username, &form.password).await;
    let next = form
        .next
        .filter(|next| !next.is_empty())
        .or_else(|| last_param(&pairs, "next").map(str::to_string));

    match outcome {
        Ok(token) => {
            let cookie = session_cookie(token.as_str(), settings.ttl_secs, settings.cookie_secure);
            let target = safe_next(next.as_deref());
            Ok(([(SET_COOKIE, cookie)], Redirect::to(target)).into_response())
        }
        Err(err) if err.is_user_error() => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(LoginView {
                username: form.username,
                next,
                errors: vec![FieldError::from(&err)],
            }),
        )
            .into_response()),
        Err(err) => Err(err.into()),
    }
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, WebError> {
    if let Some(token) = session_token(&headers) {
        state.with_accounts(|accounts, _| accounts.delete_session(&token))?;
        info!("event=session_delete module=web status=ok");
    }
    let cookie = expired_session_cookie(state.sessions.cookie_secure);
    Ok(([(SET_COOKIE, cookie)], Redirect::to(LOGIN_PATH)).into_response())
}

fn rejected_form(action: String, draft: NoteDraft, error: FieldError) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(NoteFormView::from_draft(action, draft, vec![error])),
    )
        .into_response()
}

/// Only plain decimal ids route to a note; anything else is not a page.
fn parse_note_id(raw: &str) -> Result<NoteId, WebError> {
    if raw.is_empty() || !raw.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(WebError::NotFound);
    }
    raw.parse().map_err(|_| WebError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::{last_param, parse_note_id};
    use crate::error::WebError;

    #[test]
    fn repeated_query_keys_keep_the_last_value() {
        let pairs = vec![
            ("q".to_string(), "a".to_string()),
            ("search".to_string(), "b".to_string()),
            ("q".to_string(), "c".to_string()),
        ];
        assert_eq!(last_param(&pairs, "q"), Some("c"));
        assert_eq!(last_param(&pairs, "search"), Some("b"));
        assert_eq!(last_param(&pairs, "next"), None);
    }

    #[test]
    fn note_ids_are_plain_decimal() {
        assert_eq!(parse_note_id("42").ok(), Some(42));
        for raw in ["", "abc", "-1", "+1", "1.0", "99999999999999999999"] {
            assert!(matches!(parse_note_id(raw), Err(WebError::NotFound)), "{raw}");
        }
    }
}
