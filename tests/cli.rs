mod support;

use rstest::rstest;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use support::fixtures::tmp_dir;
use support::helpers::write_file;

fn tokenator(cwd: &Path, args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tokenator"));
    cmd.current_dir(cwd).args(args);
    for key in [
        "RUST_LOG",
        "TOKENATOR_CONTEXT_WINDOW",
        "TOKENATOR_ENCODING",
        "TOKENATOR_NO_CACHE",
        "TOKENATOR_CACHE_DB",
        "TOKENATOR_PARALLEL",
    ] {
        cmd.env_remove(key);
    }
    cmd.output().unwrap()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[rstest]
fn nothing_to_scan_exits_one_without_a_cache(tmp_dir: PathBuf) {
    std::fs::create_dir_all(tmp_dir.join("empty-dir")).unwrap();

    let out = tokenator(&tmp_dir, &[]);

    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.contains("No files specified, scanning everything"), "{err}");
    assert!(err.contains("No files specified to scan (or everything was excluded)."), "{err}");
    assert!(out.stdout.is_empty());
    assert!(!tmp_dir.join(".tokenator").exists());
}

#[rstest]
fn everything_excluded_exits_one(tmp_dir: PathBuf) {
    write_file(&tmp_dir, "notes.txt", b"some words");

    let out = tokenator(&tmp_dir, &["notes.txt", "--exclude", "*.txt"]);

    assert_eq!(out.status.code(), Some(1));
    assert!(!tmp_dir.join(".tokenator").exists());
}

#[rstest]
fn unopenable_cache_exits_two(tmp_dir: PathBuf) {
    write_file(&tmp_dir, "a.txt", b"hello world");
    let db_dir = tmp_dir.join("db-is-a-dir");
    std::fs::create_dir_all(&db_dir).unwrap();

    let out = tokenator(&tmp_dir, &["a.txt", "--cache-db", db_dir.to_str().unwrap()]);

    assert_eq!(out.status.code(), Some(2));
    let err = stderr(&out);
    assert!(err.contains("failed to open token cache"), "{err}");
    assert!(out.stdout.is_empty());
}

#[rstest]
fn zero_parallelism_exits_two(tmp_dir: PathBuf) {
    write_file(&tmp_dir, "a.txt", b"hello world");

    let out = tokenator(&tmp_dir, &["a.txt", "--parallel", "0"]);

    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("Parallelism must be a positive integer"));
}

#[rstest]
fn json_summary_on_stdout(tmp_dir: PathBuf) {
    write_file(&tmp_dir, "a.txt", b"hello world");
    write_file(&tmp_dir, "b.txt", b"hello world");
    let db = tmp_dir.join("cache.db");

    let out = tokenator(
        &tmp_dir,
        &["*.txt", "--format", "json", "--parallel", "2", "--cache-db", db.to_str().unwrap()],
    );

    assert_eq!(out.status.code(), Some(0), "{}", stderr(&out));
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["files_scanned"], 2);
    assert_eq!(json["total_tokens"], 4);
    assert_eq!(json["cache_enabled"], true);
    assert!(db.exists());
}

#[rstest]
fn text_summary_with_context_window(tmp_dir: PathBuf) {
    write_file(&tmp_dir, "a.txt", b"hello world");

    let out = tokenator(&tmp_dir, &["a.txt", "--no-cache", "--context-window", "8"]);

    assert_eq!(out.status.code(), Some(0), "{}", stderr(&out));
    let table = String::from_utf8_lossy(&out.stdout);
    assert!(table.contains("Files scanned"), "{table}");
    assert!(table.contains("2 / 8"), "{table}");
    assert!(table.contains("25%"), "{table}");
    assert!(!table.contains("Cache hits"), "{table}");
    assert!(!tmp_dir.join(".tokenator").exists());
}
