//! Procedural helpers for integration tests

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokenator::pipeline::{ScanReport, Scanner};
use tokenator::storage::cache::TokenCache;
use tokenator::storage::sqlite::SqliteStore;
use tokenator::tokenizer::TokenEncoder;

/// Write `content` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

pub fn cache_db(dir: &Path) -> PathBuf {
    dir.join(".tokenator").join("cache.db")
}

/// Open a fresh cache at `db` and scan `files` with `encoder`.
pub fn scan_with(
    db: &Path,
    cache_enabled: bool,
    encoder: Arc<dyn TokenEncoder>,
    parallelism: usize,
    files: &[PathBuf],
) -> ScanReport {
    let cache = Arc::new(TokenCache::open(db, cache_enabled).unwrap());
    Scanner::new(cache, encoder, parallelism)
        .run(files, |_| {})
        .unwrap()
}

/// Rows currently persisted in the cache database.
pub fn persisted_rows(db: &Path) -> u64 {
    let store = SqliteStore::open(db).unwrap();
    store.init().unwrap();
    store.count_entries().unwrap()
}
