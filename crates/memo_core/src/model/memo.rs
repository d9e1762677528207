//! Memo domain model.
//!
//! # Responsibility
//! - Define the persisted memo shape and its write-side draft.
//! - Validate titles before anything reaches storage.
//!
//! # Invariants
//! - `title` is non-blank and at most [`TITLE_MAX_CHARS`] characters.
//! - `created_at` never changes after insert; `updated_at >= created_at`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned memo identifier.
pub type MemoId = i64;

/// Upper bound for memo titles, counted in characters.
pub const TITLE_MAX_CHARS: usize = 120;

/// Memo as read back from storage, tags included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
    pub id: MemoId,
    pub title: String,
    /// Free text; empty when the author left it blank.
    pub body: String,
    /// Unix epoch milliseconds, set once on insert.
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed on every mutation.
    pub updated_at: i64,
    /// Tag names in association order.
    pub tags: Vec<String>,
}

/// Validated write input for create/edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoDraft {
    pub title: String,
    pub body: String,
}

impl MemoDraft {
    /// Builds a draft from raw form values.
    ///
    /// The title is trimmed; the body is kept as submitted.
    ///
    /// # Errors
    /// - [`MemoValidationError::TitleRequired`] for empty or whitespace-only titles.
    /// - [`MemoValidationError::TitleTooLong`] past [`TITLE_MAX_CHARS`].
    pub fn new(title: &str, body: &str) -> Result<Self, MemoValidationError> {
        let draft = Self {
            title: title.trim().to_string(),
            body: body.to_string(),
        };
        draft.validate()?;
        Ok(draft)
    }

    /// Re-checks the title invariants on an already-built draft.
    pub fn validate(&self) -> Result<(), MemoValidationError> {
        if self.title.trim().is_empty() {
            return Err(MemoValidationError::TitleRequired);
        }
        let actual = self.title.chars().count();
        if actual > TITLE_MAX_CHARS {
            return Err(MemoValidationError::TitleTooLong {
                max: TITLE_MAX_CHARS,
                actual,
            });
        }
        Ok(())
    }
}

/// Rejected memo input. Messages are shown to end users as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoValidationError {
    TitleRequired,
    TitleTooLong { max: usize, actual: usize },
}

impl Display for MemoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TitleRequired => write!(f, "Title is required."),
            Self::TitleTooLong { max, actual } => write!(
                f,
                "Title must be at most {max} characters (got {actual})."
            ),
        }
    }
}

impl Error for MemoValidationError {}

#[cfg(test)]
mod tests {
    use super::{MemoDraft, MemoValidationError, TITLE_MAX_CHARS};

    #[test]
    fn draft_trims_title_and_keeps_body() {
        let draft = MemoDraft::new("  groceries  ", "  milk\n").unwrap();
        assert_eq!(draft.title, "groceries");
        assert_eq!(draft.body, "  milk\n");
    }

    #[test]
    fn blank_titles_are_rejected() {
        for title in ["", "   ", "\t\n", "\u{3000}"] {
            let err = MemoDraft::new(title, "x").unwrap_err();
            assert_eq!(err, MemoValidationError::TitleRequired, "title {title:?}");
        }
    }

    #[test]
    fn title_length_is_counted_in_characters() {
        let at_limit = "あ".repeat(TITLE_MAX_CHARS);
        assert!(MemoDraft::new(&at_limit, "").is_ok());

        let over = "a".repeat(TITLE_MAX_CHARS + 1);
        let err = MemoDraft::new(&over, "").unwrap_err();
        assert_eq!(
            err,
            MemoValidationError::TitleTooLong {
                max: TITLE_MAX_CHARS,
                actual: TITLE_MAX_CHARS + 1
            }
        );
    }
}
