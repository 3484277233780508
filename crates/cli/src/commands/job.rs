// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduled job commands
//!
//! `tub job run <job-id>` is what each crontab line invokes: load the
//! descriptor, call back into tubd with the stored credential, then delete
//! the descriptor and the line that fired. Cron lines name a fixed date, so
//! cleanup happens whatever the callback's outcome.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use thiserror::Error;
use tracing::Instrument;
use tub_adapters::{CrontabAdapter, SystemCrontab};
use tub_core::{JobDescriptor, JobId, TubConfig};
use tub_storage::{JobStore, JsonStore, StorageError};

use crate::client::{self, ClientError, HttpResponse};
use crate::error::TubError;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct JobArgs {
    #[command(subcommand)]
    pub command: JobCommand,
}

#[derive(Subcommand)]
pub enum JobCommand {
    /// Fire a scheduled check (invoked by cron)
    Run {
        /// Job ID from the crontab line
        job_id: String,
    },
    /// List job descriptors waiting to fire
    List,
}

/// Errors from running a scheduled job
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid job id '{0}'")]
    InvalidJobId(String),

    #[error("no descriptor for job {0}")]
    DescriptorMissing(JobId),

    #[error("job {0} carries no credential; refusing an unauthenticated callback")]
    MissingCredential(JobId),

    #[error("callback failed: {0}")]
    Callback(#[from] ClientError),

    #[error("callback rejected with HTTP {status}: {}", ClientError::error_message(.body))]
    Rejected { status: u16, body: String },

    #[error("job store error: {0}")]
    Storage(#[from] StorageError),
}

/// What one run did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRun {
    pub job_id: JobId,
    pub status: u16,
    pub lines_removed: usize,
}

/// Performs a descriptor's HTTP callback
#[async_trait]
pub trait Callback: Send + Sync {
    async fn call(&self, descriptor: &JobDescriptor) -> Result<HttpResponse, ClientError>;
}

/// Callback over HTTP
pub struct HttpCallback {
    pub timeout: Duration,
}

#[async_trait]
impl Callback for HttpCallback {
    async fn call(&self, descriptor: &JobDescriptor) -> Result<HttpResponse, ClientError> {
        let body = (!descriptor.params.is_empty())
            .then(|| serde_json::to_string(&descriptor.params))
            .transpose()?;
        client::send(
            &descriptor.method,
            &descriptor.url(),
            &descriptor.authorization(),
            body,
            self.timeout,
        )
        .await
    }
}

/// Fire one scheduled job and remove every trace of it
pub async fn run_job<X, J, B>(
    job_id: &str,
    crontab: &X,
    jobs: &J,
    callback: &B,
) -> Result<JobRun, RunError>
where
    X: CrontabAdapter,
    J: JobStore,
    B: Callback,
{
    // Untagged ids never reach the crontab as a removal pattern
    let job_id = JobId::parse(job_id).ok_or_else(|| RunError::InvalidJobId(job_id.to_string()))?;
    let span = tracing::info_span!("job.run", %job_id);

    async move {
        let outcome = match jobs.read_descriptor(&job_id) {
            Ok(Some(descriptor)) => fire(&job_id, &descriptor, callback).await,
            Ok(None) => {
                tracing::warn!("no descriptor; check already consumed or cancelled");
                Err(RunError::DescriptorMissing(job_id.clone()))
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to read descriptor");
                Err(e.into())
            }
        };

        match jobs.delete_descriptor(&job_id) {
            Ok(true) => tracing::debug!("descriptor deleted"),
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "failed to delete descriptor"),
        }
        let lines_removed = match crontab.remove_by_pattern(job_id.as_str()).await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "failed to remove own crontab line");
                0
            }
        };

        let status = outcome?;
        Ok(JobRun {
            job_id: job_id.clone(),
            status,
            lines_removed,
        })
    }
    .instrument(span)
    .await
}

async fn fire<B: Callback>(
    job_id: &JobId,
    descriptor: &JobDescriptor,
    callback: &B,
) -> Result<u16, RunError> {
    if !descriptor.has_credential() {
        tracing::error!("descriptor has no credential");
        return Err(RunError::MissingCredential(job_id.clone()));
    }

    tracing::info!(method = %descriptor.method, url = %descriptor.url(), "calling back");
    let start = std::time::Instant::now();
    let response = callback.call(descriptor).await.inspect_err(|e| {
        tracing::error!(error = %e, "callback failed");
    })?;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if response.is_success() {
        tracing::info!(status = response.status, elapsed_ms, body = %response.body, "callback completed");
        Ok(response.status)
    } else {
        tracing::error!(status = response.status, elapsed_ms, body = %response.body, "callback rejected");
        Err(RunError::Rejected {
            status: response.status,
            body: response.body,
        })
    }
}

pub async fn handle(
    command: JobCommand,
    config: &TubConfig,
    format: OutputFormat,
) -> Result<(), TubError> {
    let store = JsonStore::open(&config.state_dir)
        .map_err(|e| TubError::new("Could not open the state directory").with_source(e))?;

    match command {
        JobCommand::Run { job_id } => {
            let crontab = SystemCrontab::new()
                .with_backups(config.crontab_backup_dir(), config.runner.keep_backups);
            let callback = HttpCallback {
                timeout: config.runner.timeout,
            };
            match run_job(&job_id, &crontab, &store, &callback).await {
                Ok(run) => {
                    output::print(&run, format, |run| {
                        vec![format!(
                            "{}: HTTP {} ({} crontab line(s) removed)",
                            run.job_id, run.status, run.lines_removed
                        )]
                    });
                    Ok(())
                }
                Err(RunError::DescriptorMissing(job_id)) => {
                    Err(TubError::job_not_found(job_id.as_str()))
                }
                Err(e) => Err(TubError::new(format!("Job {} failed", job_id))
                    .with_context(e.to_string())
                    .with_source(e)),
            }
        }
        JobCommand::List => {
            let descriptors = list_descriptors(&store)
                .map_err(|e| TubError::new("Could not read job descriptors").with_source(e))?;
            output::print(&descriptors, format, |descriptors| {
                if descriptors.is_empty() {
                    return vec!["No scheduled jobs".to_string()];
                }
                let mut lines = vec![format!("{:<26} {:<22} {}", "JOB", "FIRES AT", "CALLBACK")];
                for d in descriptors {
                    lines.push(format!(
                        "{:<26} {:<22} {} {}",
                        d.job_id,
                        d.fires_at.format("%Y-%m-%d %H:%M UTC"),
                        d.method,
                        d.url
                    ));
                }
                lines
            });
            Ok(())
        }
    }
}

/// Descriptor summary without the credential
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptorSummary {
    pub job_id: JobId,
    pub method: String,
    pub url: String,
    pub fires_at: DateTime<Utc>,
    pub has_credential: bool,
}

pub fn list_descriptors<J: JobStore>(jobs: &J) -> Result<Vec<DescriptorSummary>, StorageError> {
    let mut summaries = Vec::new();
    for job_id in jobs.list_descriptors()? {
        if let Some(d) = jobs.read_descriptor(&job_id)? {
            summaries.push(DescriptorSummary {
                job_id: d.job_id.clone(),
                method: d.method.clone(),
                url: d.url(),
                fires_at: d.fires_at,
                has_credential: d.has_credential(),
            });
        }
    }
    Ok(summaries)
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
