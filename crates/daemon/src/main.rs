// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! srcdsup daemon
//!
//! Watches game server output directories and ships new files to the
//! configured remotes.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod lifecycle;

use std::path::{Path, PathBuf};

use clap::Parser;
use srcdsup_core::Config;
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};

use crate::lifecycle::{LifecycleError, Options};

#[derive(Parser, Debug)]
#[command(
    name = "srcdsup",
    version,
    about = "Upload demos and logs from game servers to remote storage"
)]
struct Args {
    /// Configuration file
    #[arg(long, env = "SRCDSUP_CONFIG", default_value = "srcdsup.toml")]
    config: PathBuf,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Lock this file and write the daemon's PID to it
    #[arg(long)]
    pid_file: Option<PathBuf>,

    /// Refresh tokens, run a single scan cycle, then exit
    #[arg(long)]
    once: bool,

    /// Validate the configuration, print a summary, then exit
    #[arg(long)]
    check: bool,

    /// Match and log files without uploading or removing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.check {
        return match Config::load(&args.config) {
            Ok(config) => {
                print!("{}", lifecycle::summary(&config));
                println!("configuration ok: {}", args.config.display());
                Ok(())
            }
            Err(e) => {
                eprintln!("invalid configuration {}: {}", args.config.display(), e);
                Err(e.into())
            }
        };
    }

    let _log_guard = setup_logging(args.log_file.as_deref())?;

    let config = match Config::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load {}: {}", args.config.display(), e);
            return Err(e.into());
        }
    };
    let update_interval = config.update_interval;
    let refresh_interval = config.token_refresh_interval;

    info!("Starting srcdsup with {}", args.config.display());

    // Set up signal handlers before the PID file announces us
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let options = Options {
        pid_file: args.pid_file.clone(),
        dry_run: args.dry_run,
    };
    let mut daemon = match lifecycle::startup(config, &options) {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to start daemon: {}", e);
            return Err(e.into());
        }
    };
    if let Some(path) = daemon.pid_file() {
        info!("Holding PID lock at {}", path.display());
    }
    if args.dry_run {
        info!("Dry run: nothing will be uploaded or removed");
    }

    daemon.refresh_tokens().await;

    if args.once {
        let report = daemon.run_cycle().await;
        info!(
            delivered = report.delivered(),
            failed = report.failed(),
            removed = report.removed(),
            aborted = report.aborted(),
            "single cycle finished"
        );
        daemon.shutdown();
        return Ok(());
    }

    let mut scan = interval(update_interval);
    scan.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // Tokens were just refreshed; the schedule starts one period from now
    let mut refresh = interval_at(Instant::now() + refresh_interval, refresh_interval);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        remotes = daemon.remote_count(),
        update_interval = ?update_interval,
        "Daemon ready"
    );

    // Main event loop
    loop {
        tokio::select! {
            _ = scan.tick() => {
                daemon.run_cycle().await;
            }

            _ = refresh.tick() => {
                daemon.refresh_tokens().await;
            }

            // A sink rejected a token between scheduled refreshes
            _ = daemon.refresh_signal.recv() => {
                info!("Token rejected, refreshing early");
                daemon.refresh_tokens().await;
            }

            // Graceful shutdown on SIGTERM
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }

            // Graceful shutdown on SIGINT
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down...");
                break;
            }
        }
    }

    daemon.shutdown();
    info!("Daemon stopped");
    Ok(())
}

fn setup_logging(
    log_file: Option<&Path>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;
    let name = path.file_name().ok_or_else(|| {
        LifecycleError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("log file has no name: {}", path.display()),
        ))
    })?;

    // Set up file appender
    let file_appender = tracing_appender::rolling::never(dir, name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();

    Ok(Some(guard))
}
