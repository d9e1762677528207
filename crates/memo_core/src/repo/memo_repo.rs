//! Memo/tag repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide memo CRUD over `memos`, `tags` and `memo_tags`.
//! - Own tag find-or-create + link logic with atomic semantics.
//! - Load tags for many memos in one query (no per-row lookups).
//!
//! # Invariants
//! - Every write runs in one `IMMEDIATE` transaction; a failing tag rolls back
//!   the memo write it belongs to.
//! - Tag names are normalized to lowercase before persistence.
//! - `updated_at` is refreshed by every successful mutation.

use crate::db::DbError;
use crate::model::memo::{Memo, MemoDraft, MemoId, MemoValidationError};
use crate::model::tag::{
    normalize_tag_name, validate_tag_name, AttachOutcome, TagAttachReport, TagAttachment,
    TagValidationError,
};
use crate::text::query::SortKey;
use crate::text::time::now_epoch_ms;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MEMO_SELECT_SQL: &str = "SELECT
    id,
    title,
    body,
    created_at,
    updated_at
FROM memos";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for memo persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(MemoValidationError),
    InvalidTag(TagValidationError),
    /// Storage failed while attaching one specific tag.
    TagAttach {
        name: String,
        source: rusqlite::Error,
    },
    Db(DbError),
    NotFound(MemoId),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidTag(err) => write!(f, "{err}"),
            Self::TagAttach { name, source } => {
                write!(f, "failed to attach tag `{name}`: {source}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "memo not found: {id}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing; run migrations first")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidTag(err) => Some(err),
            Self::TagAttach { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<MemoValidationError> for RepoError {
    fn from(value: MemoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<TagValidationError> for RepoError {
    fn from(value: TagValidationError) -> Self {
        Self::InvalidTag(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for memo list use-cases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoListQuery {
    /// Already-normalized substring filter; empty matches everything.
    pub text: String,
    pub sort: SortKey,
}

/// Repository interface for memo/tag operations.
pub trait MemoRepository {
    /// Inserts a memo and attaches `tag_names` in the same transaction.
    fn create_memo(
        &mut self,
        draft: &MemoDraft,
        tag_names: &[String],
    ) -> RepoResult<(MemoId, TagAttachReport)>;
    /// Rewrites title/body and replaces the full tag set in one transaction.
    fn update_memo(
        &mut self,
        id: MemoId,
        draft: &MemoDraft,
        tag_names: &[String],
    ) -> RepoResult<TagAttachReport>;
    /// Adds tags to a memo without removing existing links.
    fn attach_tags(&mut self, id: MemoId, tag_names: &[String]) -> RepoResult<TagAttachReport>;
    fn get_memo(&self, id: MemoId) -> RepoResult<Option<Memo>>;
    /// Lists memos matching the filter, tags loaded in one extra query.
    fn list_memos(&self, query: &MemoListQuery) -> RepoResult<Vec<Memo>>;
    /// Hard-deletes a memo; its links cascade, tags stay.
    fn delete_memo(&mut self, id: MemoId) -> RepoResult<()>;
}

/// SQLite-backed memo repository.
pub struct SqliteMemoRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteMemoRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl MemoRepository for SqliteMemoRepository<'_> {
    fn create_memo(
        &mut self,
        draft: &MemoDraft,
        tag_names: &[String],
    ) -> RepoResult<(MemoId, TagAttachReport)> {
        draft.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = now_epoch_ms();
        tx.execute(
            "INSERT INTO memos (title, body, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3);",
            params![draft.title.as_str(), draft.body.as_str(), now],
        )?;
        let id = tx.last_insert_rowid();
        let report = attach_tags_in_tx(&tx, id, tag_names)?;
        tx.commit()?;

        Ok((id, report))
    }

    fn update_memo(
        &mut self,
        id: MemoId,
        draft: &MemoDraft,
        tag_names: &[String],
    ) -> RepoResult<TagAttachReport> {
        draft.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE memos
             SET
                title = ?2,
                body = ?3,
                updated_at = max(?4, created_at)
             WHERE id = ?1;",
            params![id, draft.title.as_str(), draft.body.as_str(), now_epoch_ms()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        tx.execute("DELETE FROM memo_tags WHERE memo_id = ?1;", [id])?;
        let report = attach_tags_in_tx(&tx, id, tag_names)?;
        tx.commit()?;

        Ok(report)
    }

    fn attach_tags(&mut self, id: MemoId, tag_names: &[String]) -> RepoResult<TagAttachReport> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE memos SET updated_at = max(?2, created_at) WHERE id = ?1;",
            params![id, now_epoch_ms()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        let report = attach_tags_in_tx(&tx, id, tag_names)?;
        tx.commit()?;
        Ok(report)
    }

    fn get_memo(&self, id: MemoId) -> RepoResult<Option<Memo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEMO_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let mut memo = parse_memo_row(row)?;
        let mut tags = load_tags_grouped(
            &*self.conn,
            "WHERE mt.memo_id = ?",
            vec![Value::Integer(id)],
        )?;
        memo.tags = tags.remove(&id).unwrap_or_default();
        Ok(Some(memo))
    }

    fn list_memos(&self, query: &MemoListQuery) -> RepoResult<Vec<Memo>> {
        let mut filter_sql = String::new();
        let mut bind_values: Vec<Value> = Vec::new();
        if !query.text.is_empty() {
            filter_sql.push_str(
                " WHERE (title LIKE ?1 ESCAPE '\\' OR body LIKE ?1 ESCAPE '\\')",
            );
            bind_values.push(Value::Text(like_pattern(&query.text)));
        }

        let sql = format!(
            "{MEMO_SELECT_SQL}{filter_sql} ORDER BY {};",
            order_clause(query.sort)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values.iter()))?;
        let mut memos = Vec::new();
        while let Some(row) = rows.next()? {
            memos.push(parse_memo_row(row)?);
        }
        if memos.is_empty() {
            return Ok(memos);
        }

        let tag_filter = format!("WHERE mt.memo_id IN (SELECT id FROM memos{filter_sql})");
        let mut tags = load_tags_grouped(&*self.conn, &tag_filter, bind_values)?;
        for memo in &mut memos {
            memo.tags = tags.remove(&memo.id).unwrap_or_default();
        }
        Ok(memos)
    }

    fn delete_memo(&mut self, id: MemoId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM memos WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

/// Loads `(memo_id -> tag names)` for every link matching `filter_sql`.
///
/// Names keep association insertion order. `filter_sql` may reference the
/// `memo_tags` alias `mt`.
pub(crate) fn load_tags_grouped(
    conn: &Connection,
    filter_sql: &str,
    bind_values: Vec<Value>,
) -> RepoResult<HashMap<MemoId, Vec<String>>> {
    let sql = format!(
        "SELECT mt.memo_id, t.name
         FROM memo_tags mt
         INNER JOIN tags t ON t.id = mt.tag_id
         {filter_sql}
         ORDER BY mt.memo_id ASC, mt.id ASC;"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut grouped: HashMap<MemoId, Vec<String>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let memo_id: MemoId = row.get(0)?;
        let name: String = row.get(1)?;
        grouped.entry(memo_id).or_default().push(name);
    }
    Ok(grouped)
}

fn attach_tags_in_tx(
    tx: &Transaction<'_>,
    memo_id: MemoId,
    tag_names: &[String],
) -> RepoResult<TagAttachReport> {
    let mut report = TagAttachReport::default();
    for raw in tag_names {
        let Some(name) = normalize_tag_name(raw) else {
            continue;
        };
        validate_tag_name(&name)?;

        let attachment = attach_one(tx, memo_id, &name)
            .map_err(|source| RepoError::TagAttach { name, source })?;
        report.attachments.push(attachment);
    }
    Ok(report)
}

fn attach_one(
    tx: &Transaction<'_>,
    memo_id: MemoId,
    name: &str,
) -> rusqlite::Result<TagAttachment> {
    let created = tx.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1);", [name])?;
    let tag_id: i64 = tx.query_row("SELECT id FROM tags WHERE name = ?1;", [name], |row| {
        row.get(0)
    })?;
    let linked = tx.execute(
        "INSERT OR IGNORE INTO memo_tags (memo_id, tag_id) VALUES (?1, ?2);",
        params![memo_id, tag_id],
    )?;

    let outcome = match (created, linked) {
        (1, _) => AttachOutcome::Created,
        (_, 1) => AttachOutcome::Linked,
        _ => AttachOutcome::AlreadyLinked,
    };
    Ok(TagAttachment {
        tag_id,
        name: name.to_string(),
        outcome,
    })
}

fn parse_memo_row(row: &Row<'_>) -> RepoResult<Memo> {
    Ok(Memo {
        id: row.get("id")?,
        title: row.get("title")?,
        body: row.get("body")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        tags: Vec::new(),
    })
}

fn order_clause(sort: SortKey) -> &'static str {
    match sort {
        SortKey::Newest => "created_at DESC, id DESC",
        SortKey::Oldest => "created_at ASC, id ASC",
        SortKey::Title => "title ASC, id ASC",
    }
}

/// Wraps `text` as a `LIKE` substring pattern with `\` as escape character.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    for table in ["memos", "tags", "memo_tags"] {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}
