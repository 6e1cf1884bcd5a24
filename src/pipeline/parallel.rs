use anyhow::anyhow;
use crossbeam_channel::RecvTimeoutError;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ScanError;
use crate::pipeline::stats::{FileFailure, ScanProgress, ScanReport, ScanResult};
use crate::pipeline::{count_file, CancelToken, CountSource, FileCount, TaskError};
use crate::storage::cache::TokenCache;
use crate::tokenizer::TokenEncoder;

/// How often the collector re-checks the cancel flag while waiting.
const CANCEL_POLL: Duration = Duration::from_millis(50);

struct Completion {
    path: PathBuf,
    outcome: Result<FileCount, TaskError>,
}

/// Counts tokens across many files on a bounded pool of worker threads.
///
/// Each file is one task. Results are folded into the [`ScanResult`] as they
/// complete, in completion order. Callers must not assume any ordering
/// between files.
pub struct Scanner {
    cache: Arc<TokenCache>,
    encoder: Arc<dyn TokenEncoder>,
    parallelism: usize,
    cancel: CancelToken,
}

impl Scanner {
    pub fn new(cache: Arc<TokenCache>, encoder: Arc<dyn TokenEncoder>, parallelism: usize) -> Self {
        Self {
            cache,
            encoder,
            parallelism: parallelism.max(1),
            cancel: CancelToken::new(),
        }
    }

    /// Token that stops the scan from another thread (e.g. a Ctrl-C handler).
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Process every file once and return the aggregate.
    ///
    /// A file that cannot be read or tokenized is recorded in
    /// [`ScanReport::failures`] and does not stop the others. A cache write
    /// failure or a cancellation stops scheduling and returns immediately,
    /// without waiting for tasks already running.
    pub fn run<F>(&self, files: &[PathBuf], mut on_progress: F) -> Result<ScanReport, ScanError>
    where
        F: FnMut(&ScanProgress),
    {
        let started = Instant::now();
        if self.cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallelism)
            .thread_name(|i| format!("tokenator-{}", i))
            .build()?;

        let stats_before = self.cache.stats();
        // Stops this run's queued tasks on a fatal error without touching
        // the caller-visible token.
        let abort = CancelToken::new();
        let (tx, rx) = crossbeam_channel::unbounded::<Completion>();

        tracing::info!(
            files = files.len(),
            parallelism = self.parallelism,
            encoding = self.encoder.name(),
            cache_enabled = self.cache.is_enabled(),
            "Starting token scan"
        );

        for path in files {
            let tx = tx.clone();
            let cache = self.cache.clone();
            let encoder = self.encoder.clone();
            let cancel = self.cancel.clone();
            let abort = abort.clone();
            let path = path.clone();

            pool.spawn_fifo(move || {
                if cancel.is_cancelled() || abort.is_cancelled() {
                    return;
                }
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    count_file(&path, &cache, encoder.as_ref())
                }))
                .unwrap_or_else(|payload| {
                    Err(TaskError::File(anyhow!(
                        "worker panicked: {}",
                        panic_message(payload.as_ref())
                    )))
                });
                // The collector may already be gone after a fatal error
                let _ = tx.send(Completion { path, outcome });
            });
        }
        drop(tx);

        let mut result = ScanResult::default();
        let mut failures = Vec::new();
        let mut completed = 0usize;

        while completed < files.len() {
            if self.cancel.is_cancelled() {
                abort.cancel();
                tracing::info!(completed, files = files.len(), "Token scan cancelled");
                return Err(ScanError::Cancelled);
            }

            let completion = match rx.recv_timeout(CANCEL_POLL) {
                Ok(c) => c,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    if self.cancel.is_cancelled() {
                        return Err(ScanError::Cancelled);
                    }
                    tracing::error!(completed, files = files.len(), "Workers exited early");
                    return Err(ScanError::WorkersLost {
                        completed,
                        total: files.len(),
                    });
                }
            };
            completed += 1;

            match completion.outcome {
                Ok(count) => {
                    result.record(count.tokens);
                    tracing::debug!(
                        file = %completion.path.display(),
                        tokens = count.tokens,
                        cached = count.source == CountSource::Cached,
                        "Counted file"
                    );
                }
                Err(TaskError::File(err)) => {
                    tracing::warn!(
                        file = %completion.path.display(),
                        error = %format!("{err:#}"),
                        "Skipping file"
                    );
                    failures.push(FileFailure {
                        path: completion.path,
                        message: format!("{err:#}"),
                    });
                }
                Err(TaskError::Fatal(err)) => {
                    abort.cancel();
                    tracing::error!(
                        file = %completion.path.display(),
                        error = %err,
                        "Aborting token scan"
                    );
                    return Err(err);
                }
            }

            on_progress(&ScanProgress {
                completed,
                files_total: files.len(),
                files_scanned: result.files_scanned,
                total_tokens: result.total_tokens,
            });
        }

        let stats_after = self.cache.stats();
        let report = ScanReport {
            result,
            files_total: files.len(),
            failures,
            cache_enabled: self.cache.is_enabled(),
            cache_hits: stats_after.hits.saturating_sub(stats_before.hits),
            cache_misses: stats_after.misses.saturating_sub(stats_before.misses),
            elapsed: started.elapsed(),
        };

        tracing::info!(
            files_scanned = report.result.files_scanned,
            files_failed = report.failures.len(),
            total_tokens = report.result.total_tokens,
            cache_hits = report.cache_hits,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Token scan complete"
        );

        Ok(report)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}
