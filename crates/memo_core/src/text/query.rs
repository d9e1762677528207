//! List query normalization and sort-key resolution.

use once_cell::sync::Lazy;
use regex::Regex;

static SPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").expect("valid space regex"));

const IDEOGRAPHIC_SPACE: char = '\u{3000}';

/// Normalizes a free-text search query.
///
/// Absent input becomes `""`. Ideographic spaces turn into ASCII spaces, the
/// result is trimmed and runs of spaces collapse to one.
pub fn normalize_query(query: Option<&str>) -> String {
    let Some(raw) = query else {
        return String::new();
    };
    let ascii_spaced = raw.replace(IDEOGRAPHIC_SPACE, " ");
    SPACE_RUN_RE
        .replace_all(ascii_spaced.trim(), " ")
        .into_owned()
}

/// Memo list ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Creation time, newest first.
    #[default]
    Newest,
    /// Creation time, oldest first.
    Oldest,
    /// Title, ascending.
    Title,
}

impl SortKey {
    /// Resolves a request parameter. Unknown or absent values fall back to
    /// [`SortKey::Newest`].
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("old") => Self::Oldest,
            Some("title") => Self::Title,
            _ => Self::Newest,
        }
    }

    /// Request parameter value that round-trips through [`SortKey::parse`].
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Newest => "new",
            Self::Oldest => "old",
            Self::Title => "title",
        }
    }
}
