//! Human and machine readable output for a finished scan.

use serde::Serialize;
use std::io::{IsTerminal, Write};
use std::time::Duration;

use crate::pipeline::{FileFailure, ScanProgress, ScanReport};

/// `1234567` -> `1,234,567`
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Human timespan: `0.25 seconds`, `1 second`, `2 minutes and 5 seconds`,
/// `1 hour, 2 minutes and 5 seconds`. At most three units are shown.
pub fn format_timespan(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        let rounded = format!("{:.2}", secs);
        let rounded = rounded.trim_end_matches('0').trim_end_matches('.');
        return pluralize(rounded, "second");
    }

    let mut remaining = d.as_secs();
    let mut parts = Vec::new();
    for (unit, size) in [("day", 86_400), ("hour", 3_600), ("minute", 60), ("second", 1)] {
        let n = remaining / size;
        remaining %= size;
        if n > 0 {
            parts.push(pluralize(&n.to_string(), unit));
        }
    }
    parts.truncate(3);
    join_words(&parts)
}

fn pluralize(count: &str, unit: &str) -> String {
    if count == "1" {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

fn join_words(parts: &[String]) -> String {
    match parts {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Percentage of the context window used, rounded. `None` when no window is set.
pub fn context_window_pct(total_tokens: u64, context_window: u64) -> Option<u64> {
    if context_window == 0 {
        return None;
    }
    Some((total_tokens as f64 / context_window as f64 * 100.0).round() as u64)
}

pub fn summary_rows(report: &ScanReport, context_window: u64) -> Vec<(String, String)> {
    let total = report.result.total_tokens;
    let mut rows = vec![(
        "Files scanned".to_string(),
        format_number(report.result.files_scanned),
    )];

    let tokens_used = if context_window > 0 {
        format!("{} / {}", format_number(total), format_number(context_window))
    } else {
        format_number(total)
    };
    rows.push(("Tokens used".to_string(), tokens_used));

    if let Some(pct) = context_window_pct(total, context_window) {
        rows.push(("Context window used".to_string(), format!("{pct}%")));
    }
    if report.cache_enabled {
        rows.push(("Cache hits".to_string(), format_number(report.cache_hits)));
    }
    rows.push(("Time taken".to_string(), format_timespan(report.elapsed)));
    rows
}

/// Two-column box table of the summary rows.
pub fn render_table(rows: &[(String, String)]) -> String {
    let left = rows.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    let right = rows.iter().map(|(_, v)| v.chars().count()).max().unwrap_or(0);
    let bar = |l: &str, m: &str, r: &str| {
        format!("{l}{}{m}{}{r}\n", "─".repeat(left + 2), "─".repeat(right + 2))
    };

    let mut out = bar("┌", "┬", "┐");
    for (i, (k, v)) in rows.iter().enumerate() {
        if i > 0 {
            out.push_str(&bar("├", "┼", "┤"));
        }
        out.push_str(&format!("│ {k:<left$} │ {v:<right$} │\n"));
    }
    out.push_str(&bar("└", "┴", "┘"));
    out
}

pub fn render_text(report: &ScanReport, context_window: u64) -> String {
    render_table(&summary_rows(report, context_window))
}

pub fn render_failures(failures: &[FileFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("Skipping {}: {}\n", f.path.display(), f.message))
        .collect()
}

#[derive(Debug, Serialize)]
struct JsonSummary<'a> {
    files_scanned: u64,
    total_tokens: u64,
    files_total: usize,
    failures: &'a [FileFailure],
    cache_enabled: bool,
    cache_hits: u64,
    cache_misses: u64,
    elapsed_ms: u64,
    context_window: Option<u64>,
    context_window_used_pct: Option<u64>,
}

pub fn render_json(report: &ScanReport, context_window: u64) -> serde_json::Result<String> {
    let summary = JsonSummary {
        files_scanned: report.result.files_scanned,
        total_tokens: report.result.total_tokens,
        files_total: report.files_total,
        failures: &report.failures,
        cache_enabled: report.cache_enabled,
        cache_hits: report.cache_hits,
        cache_misses: report.cache_misses,
        elapsed_ms: report.elapsed.as_millis() as u64,
        context_window: (context_window > 0).then_some(context_window),
        context_window_used_pct: context_window_pct(report.result.total_tokens, context_window),
    };
    serde_json::to_string_pretty(&summary)
}

/// Single rewritten status line on stderr. Falls back to periodic `info` logs
/// when stderr is not a terminal.
pub struct ProgressLine {
    interactive: bool,
    drawn: bool,
}

impl ProgressLine {
    const LOG_EVERY: usize = 100;

    pub fn stderr() -> Self {
        Self {
            interactive: std::io::stderr().is_terminal(),
            drawn: false,
        }
    }

    pub fn update(&mut self, progress: &ScanProgress) {
        if self.interactive {
            let mut err = std::io::stderr().lock();
            let _ = write!(
                err,
                "\r\x1b[2KTokenizing files: {}/{} files processed, tokens found: {}",
                progress.completed,
                progress.files_total,
                format_number(progress.total_tokens)
            );
            let _ = err.flush();
            self.drawn = true;
        } else if progress.completed % Self::LOG_EVERY == 0 || progress.completed == progress.files_total {
            tracing::info!(
                "Progress: {}/{} files, {} tokens",
                progress.completed,
                progress.files_total,
                progress.total_tokens
            );
        }
    }

    pub fn finish(&mut self) {
        if self.drawn {
            let _ = writeln!(std::io::stderr());
            self.drawn = false;
        }
    }
}
