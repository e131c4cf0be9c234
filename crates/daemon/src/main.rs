// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event Router Daemon (evrd)
//!
//! Reads JSON-lines events from stdin and routes them to the configured
//! journal subscriptions. Stops on end of input, SIGINT or SIGTERM and
//! prints final statistics as JSON.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::{Path, PathBuf};

use clap::Parser;
use evr_daemon::{ingest, startup, DaemonConfig, ExitReport, IngestSummary};
use evr_router::ShutdownMode;
use serde::Serialize;
use tokio::io::BufReader;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "evrd", version, about = "Event router daemon")]
struct Args {
    /// TOML config with a [router] table and [[subscription]] journals
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs here instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Dispatch worker count (overrides router.worker_count)
    #[arg(long)]
    workers: Option<usize>,

    /// Throw away queued events on exit instead of draining them
    #[arg(long)]
    discard_on_exit: bool,
}

#[derive(Serialize)]
struct Output {
    ingest: IngestSummary,
    #[serde(flatten)]
    exit: ExitReport,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_file.as_deref())?;

    let config = match args.config.as_deref().map(DaemonConfig::load) {
        Some(Ok(config)) => config,
        Some(Err(e)) => {
            error!("Failed to load config: {}", e);
            return Err(e.into());
        }
        None => DaemonConfig::default(),
    };

    let daemon = match startup(config, args.workers) {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to start daemon: {}", e);
            return Err(e.into());
        }
    };
    info!(
        subscriptions = daemon.subscriptions.len(),
        "evrd ready, reading events from stdin"
    );

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stderr = std::io::stderr();
    let mut summary = IngestSummary::default();
    let read = tokio::select! {
        result = ingest(&daemon.router, stdin, &mut stderr, &mut summary) => {
            info!("end of input, shutting down...");
            result
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
            Ok(())
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down...");
            Ok(())
        }
    };
    if let Err(e) = &read {
        error!("Failed to read events: {}", e);
    }

    let mode = if args.discard_on_exit {
        ShutdownMode::Discard
    } else {
        ShutdownMode::Drain
    };
    let exit = daemon.shutdown(mode).await;

    let output = Output {
        ingest: summary,
        exit,
    };
    println!("{}", serde_json::to_string(&output)?);
    read?;

    info!("Daemon stopped");
    Ok(())
}

fn setup_logging(
    log_file: Option<&Path>,
) -> Result<tracing_appender::non_blocking::WorkerGuard, std::io::Error> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let (non_blocking, guard) = match log_file {
        Some(path) => {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            std::fs::create_dir_all(dir)?;
            let name = path.file_name().ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("log file path has no file name: {}", path.display()),
                )
            })?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name))
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    // Set up subscriber with env filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(log_file.is_none()).with_writer(non_blocking))
        .init();

    Ok(guard)
}
