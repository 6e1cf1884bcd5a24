use anyhow::Result;
use glob::MatchOptions;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// Pattern used when no files are given on the command line.
pub const DEFAULT_PATTERN: &str = "**/*";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Expand `patterns`, drop anything matched by `exclude_patterns`, and return
/// the existing regular files, sorted and deduplicated.
///
/// An excluded directory excludes everything below it.
pub fn resolve_files(patterns: &[String], exclude_patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut included = BTreeSet::new();
    for pattern in patterns {
        included.extend(expand_pattern(pattern));
    }

    let mut excluded = BTreeSet::new();
    for pattern in exclude_patterns {
        excluded.extend(expand_pattern(pattern));
    }

    let files: Vec<PathBuf> = included
        .into_iter()
        .filter(|path| !is_excluded(path, &excluded))
        .filter(|path| path.is_file())
        .collect();

    tracing::debug!(
        patterns = ?patterns,
        exclude_patterns = ?exclude_patterns,
        files = files.len(),
        "Resolved input files"
    );
    Ok(files)
}

fn expand_pattern(pattern: &str) -> Vec<PathBuf> {
    let mut out = Vec::new();

    // A path that exists as written counts even if it looks like a glob
    let literal = Path::new(pattern);
    if literal.exists() {
        out.push(normalize(literal));
    }

    match glob::glob_with(pattern, MATCH_OPTIONS) {
        Ok(paths) => {
            for entry in paths {
                match entry {
                    Ok(path) => out.push(normalize(&path)),
                    Err(err) => {
                        tracing::warn!(
                            path = %err.path().display(),
                            error = %err.error(),
                            "Failed to read path while expanding pattern"
                        );
                    }
                }
            }
        }
        Err(err) => {
            tracing::warn!(pattern = %pattern, error = %err, "Invalid glob pattern");
        }
    }
    out
}

fn is_excluded(path: &Path, excluded: &BTreeSet<PathBuf>) -> bool {
    excluded.contains(path) || path.ancestors().skip(1).any(|dir| excluded.contains(dir))
}

/// Strip `.` components so `./a.txt` and `a.txt` dedupe.
fn normalize(path: &Path) -> PathBuf {
    let out: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}
