//! Tag domain model and the comma-delimited tag input rule.
//!
//! # Responsibility
//! - Normalize raw tag input into stored tag names.
//! - Describe per-name attachment outcomes reported back to callers.
//!
//! # Invariants
//! - Stored names are trimmed, lowercase and at most [`TAG_NAME_MAX_CHARS`] chars.
//! - Only `,` separates names; `;` and whitespace stay part of a name.
//! - Parsing never yields duplicates; first occurrence order is kept.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned tag identifier.
pub type TagId = i64;

/// Upper bound for tag names, counted in characters.
pub const TAG_NAME_MAX_CHARS: usize = 30;

const TAG_DELIMITER: char = ',';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// Normalizes one raw tag piece. Returns `None` when nothing is left.
pub fn normalize_tag_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Splits a comma-delimited tag string into normalized, deduplicated names.
///
/// Absent input behaves like an empty string. Quoted or escaped commas are
/// not recognized.
pub fn parse_tag_csv(input: Option<&str>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for piece in input.unwrap_or_default().split(TAG_DELIMITER) {
        if let Some(name) = normalize_tag_name(piece) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// Checks a normalized name against storage bounds.
pub fn validate_tag_name(name: &str) -> Result<(), TagValidationError> {
    let actual = name.chars().count();
    if actual > TAG_NAME_MAX_CHARS {
        return Err(TagValidationError::NameTooLong {
            name: name.to_string(),
            max: TAG_NAME_MAX_CHARS,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValidationError {
    NameTooLong { name: String, max: usize },
}

impl TagValidationError {
    /// Name that failed validation.
    pub fn name(&self) -> &str {
        match self {
            Self::NameTooLong { name, .. } => name,
        }
    }
}

impl Display for TagValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameTooLong { name, max } => {
                write!(f, "tag `{name}` is longer than {max} characters")
            }
        }
    }
}

impl Error for TagValidationError {}

/// What happened to one tag name during attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachOutcome {
    /// Tag did not exist; it was created and linked.
    Created,
    /// Tag existed and was newly linked to the memo.
    Linked,
    /// Tag was already linked; nothing changed.
    AlreadyLinked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagAttachment {
    pub tag_id: TagId,
    pub name: String,
    pub outcome: AttachOutcome,
}

/// Outcome of one successful tag attachment run, in input order.
///
/// Failures never appear here: a failing name aborts the whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagAttachReport {
    pub attachments: Vec<TagAttachment>,
}

impl TagAttachReport {
    pub fn names(&self) -> Vec<&str> {
        self.attachments
            .iter()
            .map(|attachment| attachment.name.as_str())
            .collect()
    }

    pub fn count(&self, outcome: AttachOutcome) -> usize {
        self.attachments
            .iter()
            .filter(|attachment| attachment.outcome == outcome)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_tag_name, parse_tag_csv, validate_tag_name, TAG_NAME_MAX_CHARS};

    #[test]
    fn parse_trims_lowercases_and_drops_empty_pieces() {
        assert_eq!(
            parse_tag_csv(Some(" Work, ,IMPORTANT,,  ")),
            vec!["work".to_string(), "important".to_string()]
        );
    }

    #[test]
    fn parse_treats_absent_input_as_empty() {
        assert!(parse_tag_csv(None).is_empty());
        assert!(parse_tag_csv(Some("")).is_empty());
    }

    #[test]
    fn parse_collapses_case_variants_and_repeats() {
        assert_eq!(parse_tag_csv(Some("a,A,a")), vec!["a".to_string()]);
    }

    #[test]
    fn parse_splits_only_on_commas() {
        assert_eq!(
            parse_tag_csv(Some("one;two three")),
            vec!["one;two three".to_string()]
        );
    }

    #[test]
    fn normalize_returns_none_for_whitespace() {
        assert_eq!(normalize_tag_name(" \t "), None);
        assert_eq!(normalize_tag_name(" Rust "), Some("rust".to_string()));
    }

    #[test]
    fn validate_rejects_names_past_limit() {
        assert!(validate_tag_name(&"x".repeat(TAG_NAME_MAX_CHARS)).is_ok());
        let err = validate_tag_name(&"x".repeat(TAG_NAME_MAX_CHARS + 1)).unwrap_err();
        assert_eq!(err.name().chars().count(), TAG_NAME_MAX_CHARS + 1);
    }
}
