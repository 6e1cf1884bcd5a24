use anyhow::{anyhow, Context, Result};
use std::{env, path::PathBuf};

use crate::cli::{Cli, OutputFormat};
use crate::pipeline::DEFAULT_PATTERN;
use crate::tokenizer::Encoding;

pub const DEFAULT_CACHE_DB: &str = "./.tokenator/cache.db";

#[derive(Debug, Clone)]
pub struct Config {
    pub patterns: Vec<String>,
    /// No patterns were given and [`DEFAULT_PATTERN`] is used.
    pub scan_everything: bool,
    pub exclude_patterns: Vec<String>,
    /// 0 disables the comparison.
    pub context_window: u64,
    pub encoding: Encoding,
    pub cache_enabled: bool,
    pub cache_db_path: PathBuf,
    pub parallel_workers: usize,
    pub output_format: OutputFormat,
}

impl Config {
    /// Resolve settings: command-line flag, then `TOKENATOR_*` env var, then default.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let scan_everything = cli.files.is_empty();
        let patterns = if scan_everything {
            vec![DEFAULT_PATTERN.to_string()]
        } else {
            cli.files
        };

        let context_window = match cli.context_window {
            Some(v) => v,
            None => optional_env("TOKENATOR_CONTEXT_WINDOW")
                .as_deref()
                .map(parse_u64)
                .transpose()?
                .unwrap_or(0),
        };

        let encoding = match cli.tokenizer_encoding {
            Some(e) => e,
            None => optional_env("TOKENATOR_ENCODING")
                .as_deref()
                .map(|raw| raw.parse::<Encoding>().context("Invalid TOKENATOR_ENCODING"))
                .transpose()?
                .unwrap_or_default(),
        };

        let cache_enabled = if cli.no_cache {
            false
        } else {
            !optional_env("TOKENATOR_NO_CACHE")
                .as_deref()
                .map(parse_bool)
                .transpose()?
                .unwrap_or(false)
        };

        let cache_db_path = cli
            .cache_db
            .or_else(|| optional_env("TOKENATOR_CACHE_DB").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DB));

        let parallel_workers = match cli.parallel {
            Some(v) => v,
            None => optional_env("TOKENATOR_PARALLEL")
                .as_deref()
                .map(parse_usize)
                .transpose()?
                .unwrap_or_else(num_cpus::get),
        };
        if parallel_workers == 0 {
            return Err(anyhow!("Parallelism must be a positive integer"));
        }

        Ok(Self {
            patterns,
            scan_everything,
            exclude_patterns: cli.exclude,
            context_window,
            encoding,
            cache_enabled,
            cache_db_path,
            parallel_workers,
            output_format: cli.format,
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|v| {
        let v = v.trim().to_string();
        if v.is_empty() {
            None
        } else {
            Some(v)
        }
    })
}

fn parse_usize(value: &str) -> Result<usize> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|err| anyhow!("Invalid integer '{value}': {err}"))
}

fn parse_u64(value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|err| anyhow!("Invalid integer '{value}': {err}"))
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        other => Err(anyhow!("Invalid boolean '{other}'")),
    }
}
