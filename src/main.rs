//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `wayback_recovery` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - JSON-lines output of every recovery result
//!
//! All core functionality is implemented in the library crate.

use std::io::Write;
use std::process;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use wayback_recovery::app::{
    cancel_on_interrupt, print_failure_statistics, print_simple_summary, read_requests,
    summary_json,
};
use wayback_recovery::config::Opt;
use wayback_recovery::initialization::init_logger_with;
use wayback_recovery::{build_orchestrator, recover_batch, BatchReport, Config};

/// Exit code when at least one recovery hit a fatal error.
const EXIT_FATAL_RECOVERY: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; real environment variables still apply
    dotenvy::dotenv().ok();

    let opt = Opt::parse();
    let requests_path = opt.file.clone();
    let config = Config::from(opt);

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    match run(config, &requests_path).await {
        Ok(report) if report.fatal > 0 => process::exit(EXIT_FATAL_RECOVERY),
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("wayback_recovery error: {:#}", e);
            process::exit(1);
        }
    }
}

async fn run(config: Config, requests_path: &std::path::Path) -> Result<BatchReport> {
    let start = Instant::now();
    let orchestrator =
        Arc::new(build_orchestrator(&config).context("Failed to initialize recovery")?);
    let requests = read_requests(requests_path).await?;
    log::info!(
        "Recovering {} entit{} with up to {} concurrent recoveries",
        requests.len(),
        if requests.len() == 1 { "y" } else { "ies" },
        config.max_concurrency
    );

    let cancel = CancellationToken::new();
    let interrupt = cancel_on_interrupt(cancel.clone());
    let report = recover_batch(orchestrator, requests, config.max_concurrency, cancel.clone()).await;
    cancel.cancel();
    let _ = interrupt.await;

    let elapsed = start.elapsed().as_secs_f64();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for result in &report.results {
        serde_json::to_writer(&mut out, result).context("Failed to serialize result")?;
        writeln!(out).context("Failed to write result")?;
    }
    serde_json::to_writer(&mut out, &summary_json(&report, elapsed))
        .context("Failed to serialize summary")?;
    writeln!(out).context("Failed to write summary")?;
    out.flush().context("Failed to flush output")?;

    print_failure_statistics(&report);
    print_simple_summary(&report, elapsed);
    Ok(report)
}
