pub mod parallel;
pub mod scan;
pub mod stats;

use anyhow::Context;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::digest::{decode_text, digest};
use crate::error::ScanError;
use crate::storage::cache::TokenCache;
use crate::tokenizer::TokenEncoder;

pub use parallel::Scanner;
pub use scan::{resolve_files, DEFAULT_PATTERN};
pub use stats::{FileFailure, ScanProgress, ScanReport, ScanResult};

/// Shared stop flag. Once cancelled, no new file is started.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountSource {
    /// Empty after decoding; neither the cache nor the encoder was consulted.
    Empty,
    Cached,
    Tokenized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileCount {
    pub tokens: u64,
    pub source: CountSource,
}

#[derive(Debug)]
pub enum TaskError {
    /// Only this file is affected.
    File(anyhow::Error),
    /// The whole run has to stop.
    Fatal(ScanError),
}

/// Count the tokens in one file: read, decode, digest, then either reuse the
/// cached count or encode and store it.
pub fn count_file(
    path: &Path,
    cache: &TokenCache,
    encoder: &dyn TokenEncoder,
) -> Result<FileCount, TaskError> {
    let bytes = std::fs::read(path)
        .context("failed to read file")
        .map_err(TaskError::File)?;

    let text = decode_text(&bytes);
    if text.is_empty() {
        return Ok(FileCount {
            tokens: 0,
            source: CountSource::Empty,
        });
    }

    let digest = digest(&text);
    if let Some(tokens) = cache.lookup(&digest) {
        return Ok(FileCount {
            tokens,
            source: CountSource::Cached,
        });
    }

    let tokens = encoder
        .count(&text)
        .with_context(|| format!("failed to tokenize with {}", encoder.name()))
        .map_err(TaskError::File)? as u64;

    cache.store(&digest, tokens).map_err(TaskError::Fatal)?;

    Ok(FileCount {
        tokens,
        source: CountSource::Tokenized,
    })
}
