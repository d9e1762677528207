use memo_core::db::open_db_in_memory;
use memo_core::export::{
    collect_export_records, export_memos, ExportError, ExportOptions, ExportRecord,
    DEFAULT_EXPORT_INDENT, DEFAULT_EXPORT_PATH, EXIT_IO_ERROR, EXIT_PERMISSION_DENIED,
};
use memo_core::{MemoForm, MemoService, SqliteMemoRepository};
use rusqlite::Connection;
use std::fs;
use std::path::Path;

fn seeded_conn() -> Connection {
    let mut conn = open_db_in_memory().unwrap();
    {
        let repo = SqliteMemoRepository::try_new(&mut conn).unwrap();
        let mut service = MemoService::new(repo);
        for (title, body, tags) in [
            ("Test Memo 1", "Body 1", "tag1, tag2"),
            ("Test Memo 2", "Body 2", "tag2, tag3"),
            ("Test Memo 3", "Body 3", ""),
        ] {
            service
                .create_memo(&MemoForm {
                    title: title.to_string(),
                    body: body.to_string(),
                    tags: tags.to_string(),
                })
                .unwrap();
        }
    }
    conn
}

fn read_records(path: &Path) -> Vec<ExportRecord> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn default_options_match_documented_values() {
    let options = ExportOptions::default();
    assert_eq!(options.output, Path::new(DEFAULT_EXPORT_PATH));
    assert_eq!(options.output, Path::new("memo_export.json"));
    assert_eq!(options.indent, DEFAULT_EXPORT_INDENT);
    assert_eq!(options.indent, 2);
}

#[test]
fn collect_returns_memos_in_id_order_with_their_tags() {
    let conn = seeded_conn();
    let records = collect_export_records(&conn).unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].title, "Test Memo 1");
    assert_eq!(records[0].tags, vec!["tag1", "tag2"]);
    assert_eq!(records[1].tags, vec!["tag2", "tag3"]);
    assert!(records[2].tags.is_empty());
    assert!(records.windows(2).all(|pair| pair[0].id < pair[1].id));
}

#[test]
fn export_writes_json_array_to_custom_path() {
    let conn = seeded_conn();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("custom_export.json");

    let summary = export_memos(
        &conn,
        &ExportOptions {
            output: output.clone(),
            ..ExportOptions::default()
        },
    )
    .unwrap();

    assert_eq!(summary.count, 3);
    assert_eq!(summary.output, output);
    let records = read_records(&output);
    assert_eq!(records.len(), 3);
    assert_eq!(records[2].body, "Body 3");

    let raw = fs::read_to_string(&output).unwrap();
    assert!(raw.contains("\n    \"id\": 1"));
}

#[test]
fn export_honors_indent() {
    let conn = seeded_conn();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("indent_export.json");

    export_memos(&conn, &ExportOptions { output: output.clone(), indent: 4 }).unwrap();

    let raw = fs::read_to_string(&output).unwrap();
    assert!(raw.contains("\n        \"id\":"));
}

#[test]
fn export_creates_missing_parent_directories() {
    let conn = seeded_conn();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("a").join("b").join("memos.json");

    export_memos(&conn, &ExportOptions { output: output.clone(), indent: 2 }).unwrap();
    assert_eq!(read_records(&output).len(), 3);
}

#[test]
fn export_keeps_non_ascii_literal() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let repo = SqliteMemoRepository::try_new(&mut conn).unwrap();
        let mut service = MemoService::new(repo);
        service
            .create_memo(&MemoForm {
                title: "買い物".to_string(),
                body: "牛乳".to_string(),
                tags: "家".to_string(),
            })
            .unwrap();
    }
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("utf8.json");

    export_memos(&conn, &ExportOptions { output: output.clone(), indent: 2 }).unwrap();

    let raw = fs::read_to_string(&output).unwrap();
    assert!(raw.contains("\"title\": \"買い物\""));
    assert!(raw.contains("\"家\""));
    assert!(!raw.contains("\\u"));
}

#[test]
fn export_of_empty_store_writes_empty_array() {
    let conn = open_db_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("empty.json");

    let summary =
        export_memos(&conn, &ExportOptions { output: output.clone(), indent: 2 }).unwrap();
    assert_eq!(summary.count, 0);
    assert_eq!(fs::read_to_string(&output).unwrap(), "[]");
}

#[test]
fn export_into_path_under_a_regular_file_is_an_io_error() {
    let conn = seeded_conn();
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not_a_dir");
    fs::write(&blocker, "plain file").unwrap();

    let err = export_memos(
        &conn,
        &ExportOptions {
            output: blocker.join("memos.json"),
            indent: 2,
        },
    )
    .unwrap_err();

    assert!(matches!(err, ExportError::Io { .. }), "got {err:?}");
    assert_eq!(err.exit_code(), EXIT_IO_ERROR);
    assert!(err.to_string().starts_with("Failed to write file"));
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "plain file");
}

#[cfg(unix)]
#[test]
fn export_into_read_only_directory_is_permission_denied_and_keeps_prior_file() {
    use std::os::unix::fs::PermissionsExt;

    let conn = seeded_conn();
    let dir = tempfile::tempdir().unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    let output = locked.join("memo_export.json");
    fs::write(&output, "previous export").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

    // Privileged users bypass directory permissions; nothing to observe then.
    let write_check = locked.join(".write_check");
    if fs::write(&write_check, "").is_ok() {
        let _ = fs::remove_file(&write_check);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = export_memos(&conn, &ExportOptions { output: output.clone(), indent: 2 });
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let err = result.unwrap_err();
    assert!(matches!(err, ExportError::PermissionDenied { .. }), "got {err:?}");
    assert_eq!(err.exit_code(), EXIT_PERMISSION_DENIED);
    assert!(err.to_string().starts_with("Permission denied writing to"));
    assert_eq!(fs::read_to_string(&output).unwrap(), "previous export");
}

#[cfg(unix)]
#[test]
fn export_keeps_mode_of_existing_destination() {
    use std::os::unix::fs::PermissionsExt;

    let conn = seeded_conn();
    let dir = tempfile::tempdir().unwrap();
    for mode in [0o644, 0o640] {
        let output = dir.path().join(format!("export_{mode:o}.json"));
        fs::write(&output, "previous export").unwrap();
        fs::set_permissions(&output, fs::Permissions::from_mode(mode)).unwrap();

        export_memos(&conn, &ExportOptions { output: output.clone(), indent: 2 }).unwrap();

        let actual = fs::metadata(&output).unwrap().permissions().mode() & 0o777;
        assert_eq!(actual, mode);
        assert_eq!(read_records(&output).len(), 3);
    }
}

#[cfg(unix)]
#[test]
fn export_new_file_mode_stays_within_default() {
    use memo_core::export::DEFAULT_EXPORT_MODE;
    use std::os::unix::fs::PermissionsExt;

    let conn = seeded_conn();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("fresh.json");

    export_memos(&conn, &ExportOptions { output: output.clone(), indent: 2 }).unwrap();

    let mode = fs::metadata(&output).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode & !DEFAULT_EXPORT_MODE, 0);
    assert_eq!(mode & 0o600, 0o600);
}

#[test]
fn export_to_read_only_destination_is_permission_denied_and_keeps_it() {
    let conn = seeded_conn();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("memo_export.json");
    fs::write(&output, "previous export").unwrap();
    let mut permissions = fs::metadata(&output).unwrap().permissions();
    permissions.set_readonly(true);
    fs::set_permissions(&output, permissions).unwrap();

    let err = export_memos(&conn, &ExportOptions { output: output.clone(), indent: 2 })
        .unwrap_err();

    assert!(matches!(err, ExportError::PermissionDenied { .. }), "got {err:?}");
    assert_eq!(err.exit_code(), EXIT_PERMISSION_DENIED);
    assert!(err.to_string().starts_with("Permission denied writing to"));
    assert_eq!(fs::read_to_string(&output).unwrap(), "previous export");
}

#[test]
fn export_replaces_previous_file_contents() {
    let conn = seeded_conn();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("memo_export.json");
    fs::write(&output, "stale").unwrap();

    export_memos(&conn, &ExportOptions { output: output.clone(), indent: 2 }).unwrap();
    assert_eq!(read_records(&output).len(), 3);
}
