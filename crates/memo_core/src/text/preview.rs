//! Display snippet derived from a memo body.

/// Maximum preview length in characters before truncation.
pub const PREVIEW_MAX_CHARS: usize = 120;
/// Shown when the body is empty after normalization.
pub const PREVIEW_PLACEHOLDER: &str = "(no content)";
/// Appended to truncated previews.
pub const PREVIEW_ELLIPSIS: &str = "...";

/// Builds the list/detail preview for a memo body.
///
/// Rules:
/// - `\r\n` and lone `\r` become `\n`, then surrounding whitespace is trimmed.
/// - Empty text yields [`PREVIEW_PLACEHOLDER`].
/// - Text longer than [`PREVIEW_MAX_CHARS`] characters is cut to exactly that
///   many characters followed by [`PREVIEW_ELLIPSIS`].
pub fn memo_preview(body: Option<&str>) -> String {
    let normalized = normalize_line_endings(body.unwrap_or_default());
    let text = normalized.trim();
    if text.is_empty() {
        return PREVIEW_PLACEHOLDER.to_string();
    }

    let mut chars = text.char_indices();
    match chars.nth(PREVIEW_MAX_CHARS) {
        Some((cut, _)) => format!("{}{PREVIEW_ELLIPSIS}", &text[..cut]),
        None => text.to_string(),
    }
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
