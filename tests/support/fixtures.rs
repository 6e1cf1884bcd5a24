//! rstest fixtures and test doubles for scanner integration tests
//!
//! The encoders here stand in for a real tokenizer so tests can observe how
//! often encoding actually happens.

use anyhow::{anyhow, Result};
use rstest::*;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokenator::digest::ContentDigest;
use tokenator::storage::{InsertOutcome, TokenStore};
use tokenator::tokenizer::TokenEncoder;

static FIXTURE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique, freshly created directory per call.
#[fixture]
pub fn tmp_dir() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let c = FIXTURE_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("tokenator-fixture-test-{nanos}-{c}"));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[fixture]
pub fn word_encoder() -> Arc<WordCountEncoder> {
    Arc::new(WordCountEncoder::default())
}

/// One unit per whitespace-separated word. Counts how many times it ran.
#[derive(Default)]
pub struct WordCountEncoder {
    calls: AtomicUsize,
}

impl WordCountEncoder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TokenEncoder for WordCountEncoder {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(text.split_whitespace().map(|_| 1).collect())
    }

    fn name(&self) -> &str {
        "words"
    }
}

/// Fails on any text containing `marker`; counts words otherwise.
pub struct FailingEncoder {
    pub marker: &'static str,
}

impl TokenEncoder for FailingEncoder {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        if text.contains(self.marker) {
            return Err(anyhow!("unsupported content"));
        }
        Ok(text.split_whitespace().map(|_| 1).collect())
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Panics on any text containing `marker`; counts words otherwise.
pub struct PanickingEncoder {
    pub marker: &'static str,
}

impl TokenEncoder for PanickingEncoder {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        if text.contains(self.marker) {
            panic!("encoder blew up on {}", self.marker);
        }
        Ok(text.split_whitespace().map(|_| 1).collect())
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

/// Counts words after sleeping 0-7ms, chosen from `seed` and the text, so
/// tasks finish in a different order from one seed to the next.
pub struct JitterEncoder {
    pub seed: u64,
}

impl TokenEncoder for JitterEncoder {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        text.hash(&mut hasher);
        std::thread::sleep(Duration::from_millis(hasher.finish() % 8));
        Ok(text.split_whitespace().map(|_| 1).collect())
    }

    fn name(&self) -> &str {
        "jitter"
    }
}

/// Blocks every encode until [`GatedEncoder::open`] is called.
#[derive(Default)]
pub struct GatedEncoder {
    gate: Mutex<bool>,
    opened: Condvar,
    started: AtomicUsize,
}

impl GatedEncoder {
    pub fn open(&self) {
        *self.gate.lock().unwrap() = true;
        self.opened.notify_all();
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

impl TokenEncoder for GatedEncoder {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let mut open = self.gate.lock().unwrap();
        while !*open {
            open = self.opened.wait(open).unwrap();
        }
        Ok(text.split_whitespace().map(|_| 1).collect())
    }

    fn name(&self) -> &str {
        "gated"
    }
}

/// In-memory store whose `fail_on`-th insert (1-based) returns an error.
#[derive(Default)]
pub struct FlakyStore {
    pub fail_on: usize,
    inserts: AtomicUsize,
    rows: Mutex<HashMap<ContentDigest, u64>>,
}

impl FlakyStore {
    pub fn failing_on(fail_on: usize) -> Self {
        Self {
            fail_on,
            ..Self::default()
        }
    }
}

impl TokenStore for FlakyStore {
    fn load_all(&self) -> Result<HashMap<ContentDigest, u64>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    fn insert_if_absent(&self, digest: &ContentDigest, token_count: u64) -> Result<InsertOutcome> {
        let n = self.inserts.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_on {
            return Err(anyhow!("disk I/O error"));
        }
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(digest) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        rows.insert(*digest, token_count);
        Ok(InsertOutcome::Inserted)
    }
}
