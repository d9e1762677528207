//! HTTP surface for the memo board: list/create/detail/edit/delete pages.

pub mod config;
pub mod error;
pub mod render;
pub mod routes;

use axum::routing::get;
use axum::Router;

pub use config::{ConfigError, WebConfig};
pub use error::AppError;
pub use routes::{AppState, SharedState};

/// Builds the application router over shared state.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(routes::memo_list))
        .route(
            "/memos/new/",
            get(routes::new_memo_form).post(routes::create_memo),
        )
        .route("/memos/:id/", get(routes::memo_detail))
        .route(
            "/memos/:id/edit/",
            get(routes::edit_memo_form).post(routes::update_memo),
        )
        .route(
            "/memos/:id/delete/",
            get(routes::delete_memo_confirm).post(routes::delete_memo),
        )
        .fallback(routes::not_found)
        .with_state(state)
        .layer(axum::middleware::from_fn(routes::log_requests))
}
