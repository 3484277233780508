// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tub - heat-to-target hot tub control CLI

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod completions;
mod error;
mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{config, cron, heat, job};
use completions::CompletionsArgs;
use output::OutputFormat;
use tracing_subscriber::EnvFilter;
use tub_core::TubConfig;

use crate::error::TubError;

#[derive(Parser)]
#[command(
    name = "tub",
    version,
    about = "Hot tub control - heat to a target temperature, then switch off"
)]
struct Cli {
    /// Config file (default: $TUB_CONFIG or <config dir>/tub/tub.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// State directory, overriding the config file and $TUB_STATE_DIR
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t = OutputFormat::Text, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Heat-to-target session control
    Heat(heat::HeatArgs),
    /// Scheduled check jobs
    Job(job::JobArgs),
    /// Inspect or clear heat-to-target crontab lines
    Cron(cron::CronArgs),
    /// Show the effective configuration
    Config,
    /// Generate shell completions
    Completions(CompletionsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Commands::Completions(args) = &cli.command {
        completions::generate_completions::<Cli>(args.shell);
        return ExitCode::SUCCESS;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<TubError>() {
                Some(tub_error) => eprint!("{}", tub_error),
                None => eprintln!("error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = TubConfig::load(cli.config.as_deref()).context("failed to load config")?;
    if let Some(state_dir) = cli.state_dir {
        config.state_dir = state_dir;
    }

    // The runner runs under cron with no terminal; keep its log in the state dir
    let _guard = match &cli.command {
        Commands::Job(job::JobArgs {
            command: job::JobCommand::Run { .. },
        }) => setup_file_logging(&config.runner_log_path()),
        _ => {
            setup_stderr_logging();
            None
        }
    };

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let format = cli.output;
    runtime.block_on(async move {
        match cli.command {
            Commands::Heat(args) => heat::handle(args.command, &config, format).await?,
            Commands::Job(args) => job::handle(args.command, &config, format).await?,
            Commands::Cron(args) => cron::handle(args.command, &config, format).await?,
            Commands::Config => config::handle(&config, format)?,
            Commands::Completions(_) => {}
        }
        Ok::<(), TubError>(())
    })?;
    Ok(())
}

fn setup_stderr_logging() {
    let filter = EnvFilter::try_from_env("TUB_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn setup_file_logging(log_path: &Path) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let (Some(log_dir), Some(file_name)) = (log_path.parent(), log_path.file_name()) else {
        setup_stderr_logging();
        return None;
    };
    if std::fs::create_dir_all(log_dir).is_err() {
        setup_stderr_logging();
        return None;
    }
    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_env("TUB_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .try_init();
    Some(guard)
}
