use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Running aggregate of a scan. Only the scanner's collector updates it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub total_tokens: u64,
    pub files_scanned: u64,
}

impl ScanResult {
    pub(crate) fn record(&mut self, tokens: u64) {
        self.total_tokens += tokens;
        self.files_scanned += 1;
    }
}

/// Passed to the progress callback after every completed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanProgress {
    /// Files finished so far, failed ones included.
    pub completed: usize,
    pub files_total: usize,
    pub files_scanned: u64,
    pub total_tokens: u64,
}

/// A file that could not be read or tokenized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub result: ScanResult,
    pub files_total: usize,
    pub failures: Vec<FileFailure>,
    pub cache_enabled: bool,
    pub cache_hits: u64,
    pub cache_misses: u64,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}
