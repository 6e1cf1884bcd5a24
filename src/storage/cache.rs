use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use crate::digest::ContentDigest;
use crate::error::ScanError;
use crate::storage::sqlite::SqliteStore;
use crate::storage::{InsertOutcome, TokenStore};

/// In-memory mirror of the persisted token counts.
///
/// The whole table is loaded at construction; after that, lookups never touch
/// storage and memory is the source of truth for the rest of the process.
/// `store` holds the store lock across both the persist attempt and the
/// in-memory write so two stores never interleave on the connection.
pub struct TokenCache {
    store: Option<Mutex<Box<dyn TokenStore>>>,
    entries: RwLock<HashMap<ContentDigest, u64>>,
    loaded: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TokenCache {
    /// Always misses and never persists. No store is created or read.
    pub fn disabled() -> Self {
        Self {
            store: None,
            entries: RwLock::new(HashMap::new()),
            loaded: 0,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Open the sqlite-backed cache at `db_path`, or a disabled cache when
    /// `enabled` is false (in which case `db_path` is never touched).
    pub fn open(db_path: &Path, enabled: bool) -> Result<Self, ScanError> {
        if !enabled {
            return Ok(Self::disabled());
        }

        let open = || -> anyhow::Result<Self> {
            let sqlite = SqliteStore::open(db_path)?;
            sqlite.init()?;
            Self::with_store(Box::new(sqlite))
        };

        let cache = open().map_err(|error| ScanError::CacheOpen {
            path: db_path.to_path_buf(),
            error,
        })?;

        tracing::debug!(
            db_path = %db_path.display(),
            entries = cache.loaded,
            "Loaded token cache"
        );
        Ok(cache)
    }

    /// Build an enabled cache over any store, seeding memory from `load_all`.
    pub fn with_store(store: Box<dyn TokenStore>) -> anyhow::Result<Self> {
        let entries = store.load_all()?;
        Ok(Self {
            loaded: entries.len(),
            store: Some(Mutex::new(store)),
            entries: RwLock::new(entries),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn lookup(&self, digest: &ContentDigest) -> Option<u64> {
        let found = if self.is_enabled() {
            self.entries
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .get(digest)
                .copied()
        } else {
            None
        };

        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Persist `token_count` for `digest` and mirror it in memory.
    ///
    /// A digest that is already persisted (another worker won the race) is
    /// not an error: the insert is dropped and memory is still updated.
    pub fn store(&self, digest: &ContentDigest, token_count: u64) -> Result<(), ScanError> {
        let Some(store) = &self.store else {
            return Ok(());
        };

        let store = store.lock().unwrap_or_else(|e| e.into_inner());
        match store.insert_if_absent(digest, token_count) {
            Ok(InsertOutcome::Inserted) => {}
            Ok(InsertOutcome::AlreadyExists) => {
                tracing::debug!(digest = %digest, "Token count already cached, discarding duplicate");
            }
            Err(error) => {
                return Err(ScanError::CacheWrite {
                    digest: *digest,
                    error,
                });
            }
        }

        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(*digest, token_count);
        Ok(())
    }

    /// Entries loaded from storage at startup.
    pub fn loaded_entries(&self) -> usize {
        self.loaded
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            hit_rate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}
