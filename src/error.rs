use std::path::PathBuf;
use thiserror::Error;

use crate::digest::ContentDigest;

/// Failures that end a scan. Per-file problems never show up here; they are
/// collected in the report as [`crate::pipeline::stats::FileFailure`].
#[derive(Debug, Error)]
pub enum ScanError {
    /// The token cache could not be opened or initialized. Nothing was counted.
    #[error("failed to open token cache at {}: {error:#}", .path.display())]
    CacheOpen { path: PathBuf, error: anyhow::Error },

    /// A non-conflict failure while persisting a count. Outstanding work is
    /// cancelled because the store can no longer be trusted.
    #[error("failed to persist token count for {digest}: {error:#}")]
    CacheWrite {
        digest: ContentDigest,
        error: anyhow::Error,
    },

    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// Every worker went away before all files were reported.
    #[error("worker pool stopped after {completed} of {total} files")]
    WorkersLost { completed: usize, total: usize },

    /// Stopped by an external interrupt.
    #[error("scan cancelled")]
    Cancelled,
}

impl ScanError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScanError::Cancelled)
    }
}
