//! Core domain logic for the memo board.
//! This crate is the single source of truth for memo/tag invariants; the web
//! server and the CLI only adapt its APIs to their transports.

pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod text;

pub use db::{open_db, open_db_in_memory, DbError};
pub use export::{
    collect_export_records, export_memos, write_export, ExportError, ExportOptions,
    ExportRecord, ExportSummary,
};
pub use logging::{default_log_level, init_logging, init_logging_to, logging_status, LogSink};
pub use model::memo::{Memo, MemoDraft, MemoId, MemoValidationError};
pub use model::tag::{
    parse_tag_csv, AttachOutcome, Tag, TagAttachReport, TagAttachment, TagId, TagValidationError,
};
pub use repo::memo_repo::{
    MemoListQuery, MemoRepository, RepoError, RepoResult, SqliteMemoRepository,
};
pub use service::memo_service::{
    MemoForm, MemoListResult, MemoSaved, MemoService, MemoServiceError,
};
pub use text::preview::memo_preview;
pub use text::query::{normalize_query, SortKey};
pub use text::time::{format_timestamp, parse_time_zone, TimeZoneError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
