// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduled checks as one-shot crontab entries
//!
//! A scheduled check is a single crontab line plus a job descriptor file.
//! The crontab line carries the job ID as a trailing comment; every job ID
//! starts with [`JOB_TAG`], so removing by the tag clears the whole chain.

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::id::IdGen;

/// Prefix shared by every heat-to-target job ID
pub const JOB_TAG: &str = "heat-target-";

/// Identifier of one scheduled check
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Fresh ID with a new random suffix
    pub fn generate(id_gen: &impl IdGen) -> Self {
        Self(format!("{}{}", JOB_TAG, id_gen.next()))
    }

    /// Parse an ID, accepting only tagged values safe to use as a file name
    pub fn parse(s: &str) -> Option<Self> {
        let suffix = s.strip_prefix(JOB_TAG)?;
        let valid = !suffix.is_empty()
            && suffix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Round up to the next whole minute; cron cannot fire mid-minute, and a
/// check must never fire earlier than requested.
pub fn round_up_to_minute(at: DateTime<Utc>) -> DateTime<Utc> {
    let truncated = at
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at);
    if truncated == at {
        at
    } else {
        truncated + chrono::TimeDelta::minutes(1)
    }
}

/// A single crontab line that fires once at a given local minute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronEntry {
    pub schedule: String,
    pub command: String,
    pub job_id: JobId,
}

impl CronEntry {
    /// Build an entry firing at `local` (minute, hour, day, month)
    pub fn one_shot(local: NaiveDateTime, command: impl Into<String>, job_id: JobId) -> Self {
        Self {
            schedule: format!(
                "{} {} {} {} *",
                local.minute(),
                local.hour(),
                local.day(),
                local.month()
            ),
            command: command.into(),
            job_id,
        }
    }

    /// Crontab line with the job ID as trailing comment
    pub fn render(&self) -> String {
        format!("{} {} # {}", self.schedule, self.command, self.job_id)
    }

    /// Extract the job ID from a crontab line written by [`CronEntry::render`]
    pub fn job_id_of(line: &str) -> Option<JobId> {
        let (_, comment) = line.rsplit_once('#')?;
        JobId::parse(comment.trim())
    }
}

/// How cron invokes the runner for a job
///
/// Cron passes none of the daemon's environment, so everything the runner
/// needs to find the daemon's state travels on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerCommand {
    pub program: PathBuf,
    pub config_path: Option<PathBuf>,
    pub state_dir: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
}

impl RunnerCommand {
    /// Shell command line for cron
    pub fn for_job(&self, job_id: &JobId) -> String {
        let mut parts = vec![quote(&self.program.to_string_lossy())];
        if let Some(config) = &self.config_path {
            parts.push("--config".to_string());
            parts.push(quote(&config.to_string_lossy()));
        }
        if let Some(state_dir) = &self.state_dir {
            parts.push("--state-dir".to_string());
            parts.push(quote(&state_dir.to_string_lossy()));
        }
        parts.push("job".to_string());
        parts.push("run".to_string());
        parts.push(job_id.to_string());
        if let Some(log) = &self.log_path {
            parts.push(format!(">> {} 2>&1", quote(&log.to_string_lossy())));
        }
        parts.join(" ")
    }
}

fn quote(s: &str) -> String {
    shell_escape::unix::escape(Cow::Borrowed(s)).into_owned()
}

/// Everything the detached runner needs to call back into the controller.
///
/// Cron runs the runner without any interactive session, so the descriptor
/// carries its own service credential.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub job_id: JobId,
    pub method: String,
    pub base_url: String,
    pub endpoint: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    pub auth_token: String,
    pub created_at: DateTime<Utc>,
    pub fires_at: DateTime<Utc>,
}

impl JobDescriptor {
    /// Full callback URL
    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }

    /// Value for the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.auth_token)
    }

    pub fn has_credential(&self) -> bool {
        !self.auth_token.trim().is_empty()
    }
}

impl fmt::Debug for JobDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobDescriptor")
            .field("job_id", &self.job_id)
            .field("method", &self.method)
            .field("url", &self.url())
            .field("params", &self.params)
            .field("auth_token", &"<redacted>")
            .field("fires_at", &self.fires_at)
            .finish()
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
