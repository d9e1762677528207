//! HTTP-facing error mapping.

use crate::render;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use memo_core::{MemoId, MemoServiceError};
use std::fmt::{Display, Formatter};

/// Handler failure that ends the request with an error page.
///
/// Validation failures never reach this type; handlers re-render the form.
#[derive(Debug)]
pub enum AppError {
    NotFound(Option<MemoId>),
    /// Details are logged, never shown to the client.
    Internal(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(Some(id)) => write!(f, "memo not found: {id}"),
            Self::NotFound(None) => write!(f, "page not found"),
            Self::Internal(details) => write!(f, "internal error: {details}"),
        }
    }
}

impl From<MemoServiceError> for AppError {
    fn from(value: MemoServiceError) -> Self {
        match value {
            MemoServiceError::MemoNotFound(id) => Self::NotFound(Some(id)),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(_) => {
                (StatusCode::NOT_FOUND, Html(render::not_found_page())).into_response()
            }
            Self::Internal(details) => {
                log::error!("event=http_error module=web status=error error={details}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(render::server_error_page()),
                )
                    .into_response()
            }
        }
    }
}
