use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use tokenator::cli::{Cli, OutputFormat};
use tokenator::config::Config;
use tokenator::error::ScanError;
use tokenator::pipeline::{resolve_files, ScanReport, Scanner};
use tokenator::report::{render_failures, render_json, render_text, ProgressLine};
use tokenator::storage::cache::TokenCache;
use tokenator::tokenizer::{TiktokenEncoder, TokenEncoder};

const EXIT_NO_FILES: u8 = 1;
const EXIT_FATAL: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    debug!(version = env!("CARGO_PKG_VERSION"), "Starting tokenator");

    let config = match Config::from_cli(cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::from(EXIT_FATAL);
        }
    };

    run(config).await
}

async fn run(config: Config) -> ExitCode {
    if config.scan_everything {
        eprintln!("No files specified, scanning everything");
    }

    let files = match resolve_files(&config.patterns, &config.exclude_patterns) {
        Ok(files) => files,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::from(EXIT_FATAL);
        }
    };
    if files.is_empty() {
        eprintln!("No files specified to scan (or everything was excluded).");
        return ExitCode::from(EXIT_NO_FILES);
    }

    let cache = match TokenCache::open(&config.cache_db_path, config.cache_enabled) {
        Ok(cache) => Arc::new(cache),
        Err(err) => {
            error!(error = %err, "Token cache unavailable");
            eprintln!("Error: {err}");
            return ExitCode::from(EXIT_FATAL);
        }
    };

    let encoder: Arc<dyn TokenEncoder> = match TiktokenEncoder::new(config.encoding) {
        Ok(encoder) => Arc::new(encoder),
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::from(EXIT_FATAL);
        }
    };

    info!(
        files = files.len(),
        encoding = %config.encoding,
        parallel = config.parallel_workers,
        "Scanning files"
    );

    let scanner = Scanner::new(cache, encoder, config.parallel_workers);
    let cancel = scanner.cancel_token();

    let mut scan = tokio::task::spawn_blocking(move || {
        let mut progress = ProgressLine::stderr();
        let outcome = scanner.run(&files, |p| progress.update(p));
        progress.finish();
        outcome
    });

    let outcome = tokio::select! {
        joined = &mut scan => joined,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            // Let the collector notice the flag so the progress line is closed.
            let _ = scan.await;
            eprintln!("Interrupted.");
            return ExitCode::from(EXIT_INTERRUPTED);
        }
    };

    let report = match outcome {
        Ok(Ok(report)) => report,
        Ok(Err(ScanError::Cancelled)) => {
            eprintln!("Interrupted.");
            return ExitCode::from(EXIT_INTERRUPTED);
        }
        Ok(Err(err)) => {
            eprintln!("Error: {err}");
            return ExitCode::from(EXIT_FATAL);
        }
        Err(err) => {
            error!(error = %err, "Scan task failed");
            eprintln!("Error: scan task failed: {err}");
            return ExitCode::from(EXIT_FATAL);
        }
    };

    print_report(&report, &config)
}

fn print_report(report: &ScanReport, config: &Config) -> ExitCode {
    match config.output_format {
        OutputFormat::Text => print!("{}", render_text(report, config.context_window)),
        OutputFormat::Json => match render_json(report, config.context_window) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("Error: failed to serialize summary: {err}");
                return ExitCode::from(EXIT_FATAL);
            }
        },
    }
    eprint!("{}", render_failures(&report.failures));
    ExitCode::SUCCESS
}
