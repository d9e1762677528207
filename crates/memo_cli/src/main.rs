//! Memo board command-line tool.
//!
//! ## Usage
//!
//! ```bash
//! memo_cli export
//! memo_cli export --output backups/memos.json --indent 4 --db /var/lib/memo/memo.db
//! ```

use clap::{Parser, Subcommand};
use log::debug;
use memo_core::db::{open_db, DbError};
use memo_core::export::{
    collect_export_records, log_export_result, write_export, ExportError, ExportOptions,
    ExportSummary, DEFAULT_EXPORT_INDENT, DEFAULT_EXPORT_PATH, EXIT_INTERNAL, EXIT_IO_ERROR,
};
use memo_core::{init_logging_to, LogSink};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "memo_cli")]
#[command(about = "Memo board maintenance utility", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level written to stderr
    #[arg(long, env = "MEMO_LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export every memo with its tags to a JSON file
    Export(ExportArgs),
}

#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
struct ExportArgs {
    /// Destination file; parent directories are created
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_EXPORT_PATH)]
    output: PathBuf,

    /// Spaces per JSON nesting level
    #[arg(long, value_name = "N", default_value_t = DEFAULT_EXPORT_INDENT)]
    indent: usize,

    /// SQLite database to read
    #[arg(long, value_name = "PATH", env = "MEMO_DB_PATH", default_value = "memo.db")]
    db: PathBuf,
}

impl ExportArgs {
    fn options(&self) -> ExportOptions {
        ExportOptions {
            output: self.output.clone(),
            indent: self.indent,
        }
    }
}

#[derive(Debug)]
enum CliError {
    Open(DbError),
    Export(ExportError),
    /// Progress output could not be written.
    Output(io::Error),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            Self::Open(_) => EXIT_INTERNAL,
            Self::Export(err) => err.exit_code(),
            Self::Output(_) => EXIT_IO_ERROR,
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open(err) => write!(f, "Failed to open database: {err}"),
            Self::Export(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "Failed to write progress output: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open(err) => Some(err),
            Self::Export(err) => Some(err),
            Self::Output(err) => Some(err),
        }
    }
}

impl From<ExportError> for CliError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = init_logging_to(&cli.log_level, LogSink::Stderr) {
        eprintln!("memo_cli: logging disabled: {err}");
    }

    let result = match &cli.command {
        Commands::Export(args) => run_export(args, &mut io::stdout().lock()),
    };

    if let Err(err) = result {
        eprintln!("{err}");
        process::exit(err.exit_code());
    }
}

/// Runs one export, writing progress lines to `out`.
fn run_export(args: &ExportArgs, out: &mut impl Write) -> Result<ExportSummary, CliError> {
    debug!(
        "event=export_start module=cli status=ok db={} output={} indent={}",
        args.db.display(),
        args.output.display(),
        args.indent
    );
    let conn = open_db(&args.db).map_err(CliError::Open)?;
    let started_at = Instant::now();

    let records = collect_export_records(&conn);
    if let Ok(records) = &records {
        writeln!(out, "Exporting {} memos...", records.len()).map_err(CliError::Output)?;
    }
    let result = records.and_then(|records| write_export(&records, &args.options()));
    log_export_result(&result, started_at);
    let summary = result?;

    writeln!(
        out,
        "Successfully exported {} memos to {}",
        summary.count,
        summary.output.display()
    )
    .map_err(CliError::Output)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::{run_export, Cli, CliError, Commands, ExportArgs};
    use clap::Parser;
    use memo_core::db::open_db;
    use memo_core::export::{EXIT_INTERNAL, EXIT_IO_ERROR};
    use memo_core::{MemoForm, MemoService, SqliteMemoRepository};
    use std::path::{Path, PathBuf};

    fn seed(db: &Path, titles: &[&str]) {
        let mut conn = open_db(db).unwrap();
        let repo = SqliteMemoRepository::try_new(&mut conn).unwrap();
        let mut service = MemoService::new(repo);
        for title in titles {
            service
                .create_memo(&MemoForm {
                    title: title.to_string(),
                    body: "body".to_string(),
                    tags: "work, shared".to_string(),
                })
                .unwrap();
        }
    }

    fn export_args(db: &Path, output: PathBuf) -> ExportArgs {
        ExportArgs {
            output,
            indent: 2,
            db: db.to_path_buf(),
        }
    }

    #[test]
    fn export_flags_parse() {
        let cli = Cli::try_parse_from([
            "memo_cli", "export", "-o", "out/m.json", "--indent", "4", "--db", "x.db",
        ])
        .unwrap();
        let Commands::Export(args) = cli.command;
        assert_eq!(args.output, PathBuf::from("out/m.json"));
        assert_eq!(args.indent, 4);
        assert_eq!(args.db, PathBuf::from("x.db"));
    }

    #[test]
    fn export_defaults_match_documented_values() {
        let cli = Cli::try_parse_from(["memo_cli", "export"]).unwrap();
        let Commands::Export(args) = cli.command;
        assert_eq!(args.output, PathBuf::from("memo_export.json"));
        assert_eq!(args.indent, 2);
    }

    #[test]
    fn negative_indent_is_rejected() {
        assert!(Cli::try_parse_from(["memo_cli", "export", "--indent", "-1"]).is_err());
    }

    #[test]
    fn run_export_prints_progress_and_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("memo.db");
        seed(&db, &["first", "second"]);
        let output = dir.path().join("nested/export.json");

        let mut stdout = Vec::new();
        let summary = run_export(&export_args(&db, output.clone()), &mut stdout).unwrap();
        assert_eq!(summary.count, 2);

        let printed = String::from_utf8(stdout).unwrap();
        assert!(printed.starts_with("Exporting 2 memos...\n"));
        assert!(printed.contains(&format!(
            "Successfully exported 2 memos to {}",
            output.display()
        )));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(json[0]["title"], "first");
        assert_eq!(json[1]["tags"], serde_json::json!(["work", "shared"]));
    }

    #[test]
    fn io_failure_maps_to_io_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("memo.db");
        seed(&db, &["only"]);
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let mut stdout = Vec::new();
        let err = run_export(&export_args(&db, blocker.join("export.json")), &mut stdout)
            .unwrap_err();
        assert!(matches!(err, CliError::Export(_)));
        assert_eq!(err.exit_code(), EXIT_IO_ERROR);
        assert!(err.to_string().starts_with("Failed to write file"));
    }

    #[test]
    fn unopenable_database_maps_to_internal_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"plain file").unwrap();

        let mut stdout = Vec::new();
        let err = run_export(
            &export_args(&blocker.join("memo.db"), dir.path().join("out.json")),
            &mut stdout,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Open(_)));
        assert_eq!(err.exit_code(), EXIT_INTERNAL);
        assert!(stdout.is_empty());
    }
}
