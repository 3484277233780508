// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Self-rescheduling job chain
//!
//! Each scheduled check is one crontab line plus one descriptor file. At most
//! one check exists at a time: scheduling always clears every tagged entry
//! first.

use chrono::{DateTime, Local, Utc};
use std::collections::BTreeMap;
use std::time::Duration;
use tub_adapters::CrontabAdapter;
use tub_core::clock::add_duration;
use tub_core::job::round_up_to_minute;
use tub_core::{Clock, CronEntry, IdGen, JobDescriptor, JobId, RunnerCommand, TubConfig, JOB_TAG};
use tub_storage::JobStore;

use crate::ChainError;

/// Where scheduled checks call back to, and with what credential
#[derive(Clone)]
pub struct ChainConfig {
    pub base_url: String,
    pub endpoint: String,
    pub auth_token: String,
    pub runner: RunnerCommand,
}

impl ChainConfig {
    pub fn from_config(config: &TubConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            endpoint: config.heat.check_endpoint.clone(),
            auth_token: config.api_token.clone().unwrap_or_default(),
            runner: config.runner_command(),
        }
    }
}

impl std::fmt::Debug for ChainConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainConfig")
            .field("base_url", &self.base_url)
            .field("endpoint", &self.endpoint)
            .field("runner", &self.runner)
            .finish_non_exhaustive()
    }
}

/// A check that is now in the crontab
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledCheck {
    pub job_id: JobId,
    pub fires_at: DateTime<Utc>,
    pub line: String,
}

pub struct JobChain<X, J, C, I> {
    crontab: X,
    jobs: J,
    clock: C,
    id_gen: I,
    config: ChainConfig,
}

impl<X, J, C, I> JobChain<X, J, C, I>
where
    X: CrontabAdapter,
    J: JobStore,
    C: Clock,
    I: IdGen,
{
    pub fn new(crontab: X, jobs: J, clock: C, id_gen: I, config: ChainConfig) -> Self {
        Self {
            crontab,
            jobs,
            clock,
            id_gen,
            config,
        }
    }

    /// Replace whatever is scheduled with a single check `delay` from now.
    ///
    /// Fires at the first whole minute at or after `now + delay`.
    pub async fn schedule_next(&self, delay: Duration) -> Result<ScheduledCheck, ChainError> {
        if self.config.auth_token.trim().is_empty() {
            return Err(ChainError::MissingCredential);
        }

        self.crontab.remove_by_pattern(JOB_TAG).await?;
        let stale = self.delete_descriptors()?;
        if stale > 0 {
            tracing::debug!(stale, "removed stale job descriptors");
        }

        let job_id = JobId::generate(&self.id_gen);
        let now = self.clock.now();
        let fires_at = round_up_to_minute(add_duration(now, delay));

        let descriptor = JobDescriptor {
            job_id: job_id.clone(),
            method: "POST".to_string(),
            base_url: self.config.base_url.clone(),
            endpoint: self.config.endpoint.clone(),
            params: BTreeMap::new(),
            auth_token: self.config.auth_token.clone(),
            created_at: now,
            fires_at,
        };
        self.jobs.write_descriptor(&descriptor)?;

        // cron reads the schedule in the host's local time
        let local = fires_at.with_timezone(&Local).naive_local();
        let entry = CronEntry::one_shot(local, self.config.runner.for_job(&job_id), job_id.clone());
        let line = entry.render();

        if let Err(e) = self.crontab.add_entry(&line).await {
            if let Err(cleanup) = self.jobs.delete_descriptor(&job_id) {
                tracing::warn!(%job_id, error = %cleanup, "orphaned job descriptor");
            }
            return Err(e.into());
        }

        Ok(ScheduledCheck {
            job_id,
            fires_at,
            line,
        })
    }

    /// Remove every scheduled check: crontab lines and descriptors.
    ///
    /// Both halves are attempted even if one fails; returns crontab lines removed.
    pub async fn cancel_all(&self) -> Result<usize, ChainError> {
        let removed = self.crontab.remove_by_pattern(JOB_TAG).await;
        let deleted = self.delete_descriptors();

        let removed = removed?;
        let deleted = deleted?;
        if removed > 0 || deleted > 0 {
            tracing::info!(removed, deleted, "cancelled scheduled checks");
        }
        Ok(removed)
    }

    /// Tagged crontab lines
    pub async fn pending(&self) -> Result<Vec<String>, ChainError> {
        Ok(self
            .crontab
            .list_entries()
            .await?
            .into_iter()
            .filter(|line| line.contains(JOB_TAG))
            .collect())
    }

    fn delete_descriptors(&self) -> Result<usize, ChainError> {
        let mut deleted = 0;
        for job_id in self.jobs.list_descriptors()? {
            if self.jobs.delete_descriptor(&job_id)? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

#[cfg(test)]
#[path = "chain_tests.rs"]
mod tests;
