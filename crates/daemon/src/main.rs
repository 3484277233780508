// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hot-tub daemon (tubd)
//!
//! Serves the heat-to-target API and the ESP32 ingestion endpoint.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::PathBuf;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tub_core::{locate_program, TubConfig};
use tub_daemon::{lifecycle, LifecycleError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse arguments: `tubd [CONFIG]`
    let args: Vec<String> = std::env::args().collect();
    let config_path = args.get(1).map(PathBuf::from);

    // Load configuration; cron lines must not depend on this process's cwd or env
    let mut config = TubConfig::load(config_path.as_deref())?;
    config.pin_runner_paths(&std::env::current_dir()?, |name| {
        locate_program(name, &program_search_path())
    })?;

    // Write startup marker to log (before tracing setup, so operators can find it)
    write_startup_marker(&config)?;

    // Set up logging
    let log_guard = setup_logging(&config)?;

    info!(config = ?config.redacted(), "Starting tubd");

    // Start daemon
    let daemon = match lifecycle::startup(&config).await {
        Ok(d) => d,
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&config, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    info!("Daemon ready, listening on {}", config.listen);

    // Signal ready for parent process (e.g., systemd)
    println!("READY");

    if let Err(e) = daemon.run(shutdown_signal()).await {
        error!("Daemon error: {}", e);
        return Err(e.into());
    }

    info!("Daemon stopped");
    Ok(())
}

/// Directory of this binary first (tub ships next to tubd), then `$PATH`
fn program_search_path() -> Vec<PathBuf> {
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from));
    let path = std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect::<Vec<_>>())
        .unwrap_or_default();
    beside_exe.into_iter().chain(path).collect()
}

/// Resolves on SIGTERM or SIGINT
async fn shutdown_signal() {
    let (Ok(mut sigterm), Ok(mut sigint)) = (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) else {
        error!("Failed to install signal handlers");
        return std::future::pending().await;
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
    }
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- tubd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- tubd: starting (pid: ";

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(config: &TubConfig) -> Result<(), LifecycleError> {
    use std::io::Write;

    std::fs::create_dir_all(config.log_dir())?;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.daemon_log_path())?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file.
fn write_startup_error(config: &TubConfig, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.daemon_log_path())
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

fn setup_logging(
    config: &TubConfig,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir)?;

    // Append-only; rotation is left to the host
    let file_appender = tracing_appender::rolling::never(&log_dir, "tubd.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
