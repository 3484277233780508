// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crontab inspection and recovery
//!
//! These work directly on the crontab and the state directory, without the
//! daemon, so a chain left behind by a crashed daemon can still be cleared.

use clap::{Args, Subcommand};
use serde::Serialize;
use tub_adapters::{CrontabAdapter, CrontabError, SystemCrontab};
use tub_core::{CronEntry, JobId, TubConfig, JOB_TAG};
use tub_storage::{JobStore, JsonStore, StorageError};

use crate::error::TubError;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct CronArgs {
    #[command(subcommand)]
    pub command: CronCommand,
}

#[derive(Subcommand)]
pub enum CronCommand {
    /// Show heat-to-target crontab lines and their descriptors
    List,
    /// Remove every heat-to-target crontab line and descriptor
    Clear,
}

/// One tagged crontab line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledLine {
    pub line: String,
    pub job_id: Option<JobId>,
    pub has_descriptor: bool,
}

/// What `cron clear` removed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cleared {
    pub lines_removed: usize,
    pub descriptors_removed: usize,
}

pub async fn handle(
    command: CronCommand,
    config: &TubConfig,
    format: OutputFormat,
) -> Result<(), TubError> {
    let store = JsonStore::open(&config.state_dir)
        .map_err(|e| TubError::new("Could not open the state directory").with_source(e))?;
    let crontab =
        SystemCrontab::new().with_backups(config.crontab_backup_dir(), config.runner.keep_backups);

    match command {
        CronCommand::List => {
            let lines = scheduled_lines(&crontab, &store).await.map_err(|e| {
                TubError::new("Could not read the crontab")
                    .with_suggestion("Check that `crontab -l` works for this user")
                    .with_source(e)
            })?;
            output::print(&lines, format, |lines| render_lines(lines));
        }
        CronCommand::Clear => {
            let cleared = clear(&crontab, &store).await.map_err(|e| {
                TubError::new("Could not clear scheduled checks").with_context(e.to_string())
            })?;
            output::print(&cleared, format, |c| {
                vec![format!(
                    "Removed {} crontab line(s) and {} descriptor(s)",
                    c.lines_removed, c.descriptors_removed
                )]
            });
        }
    }
    Ok(())
}

pub async fn scheduled_lines<X: CrontabAdapter, J: JobStore>(
    crontab: &X,
    jobs: &J,
) -> Result<Vec<ScheduledLine>, CrontabError> {
    let mut lines = Vec::new();
    for line in crontab.list_entries().await? {
        if !line.contains(JOB_TAG) {
            continue;
        }
        let job_id = CronEntry::job_id_of(&line);
        let has_descriptor = match &job_id {
            Some(id) => matches!(jobs.read_descriptor(id), Ok(Some(_))),
            None => false,
        };
        lines.push(ScheduledLine {
            line,
            job_id,
            has_descriptor,
        });
    }
    Ok(lines)
}

#[derive(Debug, thiserror::Error)]
pub enum ClearError {
    #[error("crontab error: {0}")]
    Crontab(#[from] CrontabError),
    #[error("job store error: {0}")]
    Storage(#[from] StorageError),
}

/// Remove every tagged line, then every descriptor
pub async fn clear<X: CrontabAdapter, J: JobStore>(
    crontab: &X,
    jobs: &J,
) -> Result<Cleared, ClearError> {
    let lines_removed = crontab.remove_by_pattern(JOB_TAG).await?;
    let mut descriptors_removed = 0;
    for job_id in jobs.list_descriptors()? {
        if jobs.delete_descriptor(&job_id)? {
            descriptors_removed += 1;
        }
    }
    tracing::info!(lines_removed, descriptors_removed, "cleared scheduled checks");
    Ok(Cleared {
        lines_removed,
        descriptors_removed,
    })
}

fn render_lines(lines: &[ScheduledLine]) -> Vec<String> {
    if lines.is_empty() {
        return vec!["No heat-to-target crontab lines".to_string()];
    }
    lines
        .iter()
        .map(|l| {
            let marker = if l.has_descriptor { "" } else { "  (no descriptor)" };
            format!("{}{}", l.line, marker)
        })
        .collect()
}
