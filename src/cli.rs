//! Command-line arguments

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::tokenizer::Encoding;

const AFTER_HELP: &str = "\
The tiktoken encodings are described at
https://github.com/openai/openai-cookbook/blob/main/examples/How_to_count_tokens_with_tiktoken.ipynb

Environment (flags take precedence):
  TOKENATOR_ENCODING=o200k_base        tokenizer encoding
  TOKENATOR_CACHE_DB=PATH              token cache location (default: ./.tokenator/cache.db)
  TOKENATOR_NO_CACHE=true|false        disable the token cache
  TOKENATOR_PARALLEL=N                 worker threads (default: number of CPUs)
  TOKENATOR_CONTEXT_WINDOW=N           context window to compare against
  RUST_LOG=debug                       log filter (logs go to stderr)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Count how many tokenizer tokens a set of files would consume.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "tokenator", version, after_help = AFTER_HELP)]
pub struct Cli {
    /// Files or glob patterns to scan; `**` matches across directories.
    /// Scans everything under the current directory when omitted.
    pub files: Vec<String>,

    /// Exclude files matching glob; can be specified multiple times
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// The length of the context window to compare against
    #[arg(long, value_name = "TOKENS")]
    pub context_window: Option<u64>,

    /// The tokenizer encoding to use [default: o200k_base]
    #[arg(long, value_enum, value_name = "ENCODING")]
    pub tokenizer_encoding: Option<Encoding>,

    /// Don't write to or read from the cache
    #[arg(long)]
    pub no_cache: bool,

    /// Location of the token cache database
    #[arg(long, value_name = "PATH")]
    pub cache_db: Option<PathBuf>,

    /// The number of parallel threads to use; defaults to the number of CPU
    /// cores available
    #[arg(long, value_name = "N")]
    pub parallel: Option<usize>,

    /// Summary output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}
