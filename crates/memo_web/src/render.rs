//! Server-rendered HTML pages.
//!
//! Every user-supplied string passes through [`escape_html`] before it is
//! interpolated into markup.

use chrono_tz::Tz;
use memo_core::{core_version, format_timestamp, memo_preview, Memo, MemoForm, MemoId, SortKey};

const STYLE: &str = r#"
    body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; max-width: 760px; margin: 0 auto; padding: 24px; color: #222; }
    a { color: #2563eb; text-decoration: none; }
    .memo { border-bottom: 1px solid #e5e7eb; padding: 12px 0; }
    .preview { color: #555; white-space: pre-wrap; }
    .meta { color: #888; font-size: 12px; }
    .chip { display: inline-block; background: #eef2ff; border-radius: 10px; padding: 1px 8px; margin-right: 4px; font-size: 12px; }
    .error { background: #fef2f2; color: #b91c1c; padding: 8px 12px; border-radius: 6px; }
    pre.body { white-space: pre-wrap; background: #f9fafb; padding: 12px; border-radius: 6px; }
    label { display: block; margin-top: 12px; font-weight: 600; }
    input[type=text], textarea { width: 100%; box-sizing: border-box; padding: 6px; }
    footer { margin-top: 32px; color: #aaa; font-size: 11px; }
"#;

/// Create and edit share one form; the mode decides labels and action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(MemoId),
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

pub fn list_path() -> &'static str {
    "/"
}

pub fn new_memo_path() -> &'static str {
    "/memos/new/"
}

pub fn detail_path(id: MemoId) -> String {
    format!("/memos/{id}/")
}

pub fn edit_path(id: MemoId) -> String {
    format!("/memos/{id}/edit/")
}

pub fn delete_path(id: MemoId) -> String {
    format!("/memos/{id}/delete/")
}

fn layout(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} - Memo Board</title>
<style>{STYLE}</style>
</head>
<body>
<header><a href="{home}">Memo Board</a></header>
{content}
<footer>memo_core {version}</footer>
</body>
</html>
"#,
        title = escape_html(title),
        home = list_path(),
        version = core_version(),
    )
}

fn tag_chips(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("<span class=\"chip\">{}</span>", escape_html(tag)))
        .collect::<Vec<_>>()
        .join("")
}

fn sort_option(value: SortKey, selected: SortKey, label: &str) -> String {
    let marker = if value == selected { " selected" } else { "" };
    format!(
        "<option value=\"{}\"{marker}>{label}</option>",
        value.as_param()
    )
}

pub fn list_page(items: &[Memo], query: &str, sort: SortKey, tz: Tz) -> String {
    let mut rows = String::new();
    for memo in items {
        rows.push_str(&format!(
            r#"<div class="memo">
<a href="{href}"><strong>{title}</strong></a>
<div class="preview">{preview}</div>
<div>{chips}</div>
<div class="meta">updated {updated}</div>
</div>
"#,
            href = detail_path(memo.id),
            title = escape_html(&memo.title),
            preview = escape_html(&memo_preview(Some(&memo.body))),
            chips = tag_chips(&memo.tags),
            updated = format_timestamp(memo.updated_at, tz),
        ));
    }
    if rows.is_empty() {
        rows = "<p>No memos found.</p>".to_string();
    }

    let content = format!(
        r#"<h1>Memos</h1>
<p><a href="{new}">New memo</a></p>
<form method="get" action="{list}">
<input type="text" name="q" value="{query}" placeholder="Search title or body">
<select name="sort">{newest}{oldest}{by_title}</select>
<button type="submit">Search</button>
</form>
<p class="meta">{count} memo(s)</p>
{rows}"#,
        new = new_memo_path(),
        list = list_path(),
        query = escape_html(query),
        newest = sort_option(SortKey::Newest, sort, "Newest first"),
        oldest = sort_option(SortKey::Oldest, sort, "Oldest first"),
        by_title = sort_option(SortKey::Title, sort, "Title"),
        count = items.len(),
    );
    layout("Memos", &content)
}

pub fn detail_page(memo: &Memo, tz: Tz) -> String {
    let content = format!(
        r#"<h1>{title}</h1>
<div>{chips}</div>
<p class="preview">{preview}</p>
<pre class="body">{body}</pre>
<p class="meta">created {created} / updated {updated}</p>
<p><a href="{edit}">Edit</a> | <a href="{delete}">Delete</a> | <a href="{list}">Back to list</a></p>"#,
        title = escape_html(&memo.title),
        chips = tag_chips(&memo.tags),
        preview = escape_html(&memo_preview(Some(&memo.body))),
        body = escape_html(&memo.body),
        created = format_timestamp(memo.created_at, tz),
        updated = format_timestamp(memo.updated_at, tz),
        edit = edit_path(memo.id),
        delete = delete_path(memo.id),
        list = list_path(),
    );
    layout(&memo.title, &content)
}

/// Renders the create/edit form with the submitted values and an optional message.
pub fn form_page(mode: FormMode, form: &MemoForm, error: Option<&str>) -> String {
    let (heading, action, cancel) = match mode {
        FormMode::Create => (
            "New memo".to_string(),
            new_memo_path().to_string(),
            list_path().to_string(),
        ),
        FormMode::Edit(id) => ("Edit memo".to_string(), edit_path(id), detail_path(id)),
    };
    let error_html = error
        .map(|message| format!("<p class=\"error\">{}</p>", escape_html(message)))
        .unwrap_or_default();

    let content = format!(
        r#"<h1>{heading}</h1>
{error_html}
<form method="post" action="{action}">
<label for="title">Title</label>
<input type="text" id="title" name="title" value="{title}" maxlength="120">
<label for="body">Body</label>
<textarea id="body" name="body" rows="8">{body}</textarea>
<label for="tags">Tags (comma separated)</label>
<input type="text" id="tags" name="tags" value="{tags}">
<p><button type="submit">Save</button> <a href="{cancel}">Cancel</a></p>
</form>"#,
        title = escape_html(&form.title),
        body = escape_html(&form.body),
        tags = escape_html(&form.tags),
    );
    layout(&heading, &content)
}

/// Prefills the edit form from a stored memo.
pub fn form_from_memo(memo: &Memo) -> MemoForm {
    MemoForm {
        title: memo.title.clone(),
        body: memo.body.clone(),
        tags: memo.tags.join(", "),
    }
}

pub fn delete_confirm_page(memo: &Memo) -> String {
    let content = format!(
        r#"<h1>Delete memo</h1>
<p>Delete <strong>{title}</strong>? This cannot be undone.</p>
<form method="post" action="{action}">
<button type="submit">Delete</button> <a href="{cancel}">Cancel</a>
</form>"#,
        title = escape_html(&memo.title),
        action = delete_path(memo.id),
        cancel = detail_path(memo.id),
    );
    layout("Delete memo", &content)
}

pub fn not_found_page() -> String {
    layout(
        "Not found",
        &format!(
            "<h1>Not found</h1>\n<p>The requested memo does not exist.</p>\n<p><a href=\"{}\">Back to list</a></p>",
            list_path()
        ),
    )
}

pub fn server_error_page() -> String {
    layout(
        "Server error",
        "<h1>Something went wrong</h1>\n<p>The request could not be completed. Please try again later.</p>",
    )
}
