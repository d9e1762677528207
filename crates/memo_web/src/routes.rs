//! Axum route handlers for the memo pages.

use crate::error::AppError;
use crate::render::{self, FormMode};
use axum::extract::{Path, Query, Request, State};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use chrono_tz::Tz;
use log::info;
use memo_core::{MemoForm, MemoId, MemoService, MemoServiceError, SqliteMemoRepository};
use rusqlite::Connection;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Instant;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    conn: Mutex<Connection>,
    pub time_zone: Tz,
}

impl AppState {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection, time_zone: Tz) -> Self {
        Self {
            conn: Mutex::new(conn),
            time_zone,
        }
    }

    /// Runs `work` against a service bound to the shared connection.
    ///
    /// The lock is held only for the duration of `work`.
    pub fn with_service<T>(
        &self,
        work: impl for<'conn> FnOnce(&mut MemoService<SqliteMemoRepository<'conn>>) -> T,
    ) -> Result<T, AppError> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| AppError::Internal("database connection lock poisoned".to_string()))?;
        let repo = SqliteMemoRepository::try_new(&mut *guard)
            .map_err(|err| AppError::Internal(err.to_string()))?;
        let mut service = MemoService::new(repo);
        Ok(work(&mut service))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    pub sort: Option<String>,
}

fn parse_memo_id(raw: &str) -> Result<MemoId, AppError> {
    raw.parse::<MemoId>().map_err(|_| AppError::NotFound(None))
}

/// Re-renders the form for input errors; everything else becomes an error page.
fn form_or_error(
    mode: FormMode,
    form: &MemoForm,
    err: MemoServiceError,
) -> Result<Response, AppError> {
    if err.is_user_error() {
        let message = err.to_string();
        Ok(Html(render::form_page(mode, form, Some(&message))).into_response())
    } else {
        Err(err.into())
    }
}

// GET /
pub async fn memo_list(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Html<String>, AppError> {
    let result = state
        .with_service(|service| service.list_memos(params.q.as_deref(), params.sort.as_deref()))??;
    Ok(Html(render::list_page(
        &result.items,
        &result.query,
        result.sort,
        state.time_zone,
    )))
}

// GET /memos/new/
pub async fn new_memo_form() -> Html<String> {
    Html(render::form_page(FormMode::Create, &MemoForm::default(), None))
}

// POST /memos/new/
pub async fn create_memo(
    State(state): State<SharedState>,
    Form(form): Form<MemoForm>,
) -> Result<Response, AppError> {
    match state.with_service(|service| service.create_memo(&form))? {
        Ok(saved) => Ok(Redirect::to(&render::detail_path(saved.memo.id)).into_response()),
        Err(err) => form_or_error(FormMode::Create, &form, err),
    }
}

// GET /memos/:id/
pub async fn memo_detail(
    State(state): State<SharedState>,
    Path(raw_id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_memo_id(&raw_id)?;
    let memo = state.with_service(|service| service.require_memo(id))??;
    Ok(Html(render::detail_page(&memo, state.time_zone)))
}

// GET /memos/:id/edit/
pub async fn edit_memo_form(
    State(state): State<SharedState>,
    Path(raw_id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_memo_id(&raw_id)?;
    let memo = state.with_service(|service| service.require_memo(id))??;
    Ok(Html(render::form_page(
        FormMode::Edit(id),
        &render::form_from_memo(&memo),
        None,
    )))
}

// POST /memos/:id/edit/
pub async fn update_memo(
    State(state): State<SharedState>,
    Path(raw_id): Path<String>,
    Form(form): Form<MemoForm>,
) -> Result<Response, AppError> {
    let id = parse_memo_id(&raw_id)?;
    match state.with_service(|service| service.update_memo(id, &form))? {
        Ok(saved) => Ok(Redirect::to(&render::detail_path(saved.memo.id)).into_response()),
        Err(err) => form_or_error(FormMode::Edit(id), &form, err),
    }
}

// GET /memos/:id/delete/
pub async fn delete_memo_confirm(
    State(state): State<SharedState>,
    Path(raw_id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_memo_id(&raw_id)?;
    let memo = state.with_service(|service| service.require_memo(id))??;
    Ok(Html(render::delete_confirm_page(&memo)))
}

// POST /memos/:id/delete/
pub async fn delete_memo(
    State(state): State<SharedState>,
    Path(raw_id): Path<String>,
) -> Result<Redirect, AppError> {
    let id = parse_memo_id(&raw_id)?;
    state.with_service(|service| service.delete_memo(id))??;
    Ok(Redirect::to(render::list_path()))
}

pub async fn not_found() -> AppError {
    AppError::NotFound(None)
}

/// Emits one `http_request` event per request, after the response is built.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started_at = Instant::now();
    let response = next.run(request).await;
    info!(
        "event=http_request module=web status={} method={method} path={path} duration_ms={}",
        response.status().as_u16(),
        started_at.elapsed().as_millis()
    );
    response
}
