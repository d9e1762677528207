//! JSON snapshot export of every memo and its tags.
//!
//! # Responsibility
//! - Read all memos and all tag links in exactly two queries.
//! - Serialize to a UTF-8 JSON array with configurable indentation.
//! - Replace the destination file atomically.
//!
//! # Invariants
//! - Query count does not depend on memo count.
//! - Records are ordered by memo id; tags keep association insertion order.
//! - A failed export leaves any previous file at the destination untouched.

use crate::model::memo::MemoId;
use crate::repo::memo_repo::{load_tags_grouped, RepoError};
use log::{error, info};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::Permissions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Destination used when no output path is given.
pub const DEFAULT_EXPORT_PATH: &str = "memo_export.json";
/// Spaces per nesting level when no indent is given.
pub const DEFAULT_EXPORT_INDENT: usize = 2;

/// Unix mode for newly created export files.
pub const DEFAULT_EXPORT_MODE: u32 = 0o644;

/// Process exit code for permission failures (`EX_NOPERM`).
pub const EXIT_PERMISSION_DENIED: i32 = 77;
/// Process exit code for other filesystem failures (`EX_IOERR`).
pub const EXIT_IO_ERROR: i32 = 74;
/// Process exit code for storage/serialization failures (`EX_SOFTWARE`).
pub const EXIT_INTERNAL: i32 = 70;

/// One exported memo, in wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub id: MemoId,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub output: PathBuf,
    pub indent: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_EXPORT_PATH),
            indent: DEFAULT_EXPORT_INDENT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub count: usize,
    pub output: PathBuf,
}

#[derive(Debug)]
pub enum ExportError {
    /// Reading memos or tags failed.
    Repo(RepoError),
    Serialize(serde_json::Error),
    /// The destination (or its directory) is not writable by this process.
    PermissionDenied { path: PathBuf, source: io::Error },
    /// Any other filesystem failure while preparing or writing the file.
    Io { path: PathBuf, source: io::Error },
}

impl ExportError {
    /// Distinct non-zero process exit code per failure class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::PermissionDenied { .. } => EXIT_PERMISSION_DENIED,
            Self::Io { .. } => EXIT_IO_ERROR,
            Self::Repo(_) | Self::Serialize(_) => EXIT_INTERNAL,
        }
    }

    fn from_io(path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        match source.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path, source },
            _ => Self::Io { path, source },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Repo(_) => "export_read_failed",
            Self::Serialize(_) => "export_serialize_failed",
            Self::PermissionDenied { .. } => "export_permission_denied",
            Self::Io { .. } => "export_write_failed",
        }
    }
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "Unexpected error during export: {err}"),
            Self::Serialize(err) => write!(f, "Failed to encode memos as JSON: {err}"),
            Self::PermissionDenied { path, source } => {
                write!(f, "Permission denied writing to {}: {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Failed to write file {}: {source}", path.display())
            }
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::PermissionDenied { source, .. } | Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<RepoError> for ExportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for ExportError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Loads every memo with its tags using one memo query and one link query.
pub fn collect_export_records(conn: &Connection) -> Result<Vec<ExportRecord>, ExportError> {
    let mut tags = load_tags_grouped(conn, "", Vec::new())?;

    let mut stmt = conn.prepare("SELECT id, title, body FROM memos ORDER BY id ASC;")?;
    let mut rows = stmt.query([])?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let id: MemoId = row.get(0)?;
        records.push(ExportRecord {
            id,
            title: row.get(1)?,
            body: row.get(2)?,
            tags: tags.remove(&id).unwrap_or_default(),
        });
    }
    Ok(records)
}

/// Encodes records as a JSON array. Non-ASCII text is written literally.
pub fn render_export_json(records: &[ExportRecord], indent: usize) -> Result<Vec<u8>, ExportError> {
    let indent_unit = " ".repeat(indent);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent_unit.as_bytes());
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    records.serialize(&mut serializer)?;
    Ok(buffer)
}

/// Writes records to `options.output`, creating parent directories.
///
/// The payload goes to a temporary file next to the destination and is then
/// renamed over it. A read-only destination is refused rather than replaced.
pub fn write_export(
    records: &[ExportRecord],
    options: &ExportOptions,
) -> Result<ExportSummary, ExportError> {
    let payload = render_export_json(records, options.indent)?;
    let output = options.output.as_path();
    let directory = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    std::fs::create_dir_all(directory).map_err(|err| ExportError::from_io(directory, err))?;
    let existing = existing_permissions(output)?;
    let mut builder = tempfile::Builder::new();
    builder.prefix(".memo_export");
    if let Some(permissions) = default_permissions() {
        builder.permissions(permissions);
    }
    let mut staged = builder
        .tempfile_in(directory)
        .map_err(|err| ExportError::from_io(output, err))?;
    if let Some(permissions) = existing {
        staged
            .as_file()
            .set_permissions(permissions)
            .map_err(|err| ExportError::from_io(output, err))?;
    }
    staged
        .write_all(&payload)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|err| ExportError::from_io(output, err))?;
    staged
        .persist(output)
        .map_err(|err| ExportError::from_io(output, err.error))?;

    Ok(ExportSummary {
        count: records.len(),
        output: output.to_path_buf(),
    })
}

/// Permissions of an existing destination, which the replacement keeps.
///
/// A read-only destination is a permission failure. New files are created
/// with [`DEFAULT_EXPORT_MODE`], subject to the process umask.
fn existing_permissions(output: &Path) -> Result<Option<Permissions>, ExportError> {
    match std::fs::metadata(output) {
        Ok(metadata) => {
            let permissions = metadata.permissions();
            if permissions.readonly() {
                return Err(ExportError::PermissionDenied {
                    path: output.to_path_buf(),
                    source: io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        "destination file is read-only",
                    ),
                });
            }
            Ok(Some(permissions))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(ExportError::from_io(output, err)),
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(DEFAULT_EXPORT_MODE))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<Permissions> {
    None
}

/// Collects and writes in one call, logging the outcome.
pub fn export_memos(
    conn: &Connection,
    options: &ExportOptions,
) -> Result<ExportSummary, ExportError> {
    let started_at = Instant::now();
    let result = collect_export_records(conn).and_then(|records| write_export(&records, options));
    log_export_result(&result, started_at);
    result
}

/// Emits the `memo_export` event for a finished export.
pub fn log_export_result(result: &Result<ExportSummary, ExportError>, started_at: Instant) {
    match result {
        Ok(summary) => info!(
            "event=memo_export module=export status=ok count={} duration_ms={}",
            summary.count,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=memo_export module=export status=error duration_ms={} error_code={} error={}",
            started_at.elapsed().as_millis(),
            err.code(),
            err
        ),
    }
}
