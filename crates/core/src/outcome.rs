// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured results of control-loop operations
//!
//! Collaborator failures never escape the controller; they land in
//! `errors` next to the facts that did happen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::job::JobId;
use crate::session::HeatingSession;

/// Result of one evaluation of the control loop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Session state after the call
    pub active: bool,
    pub heating: bool,
    pub heater_turned_on: bool,
    pub target_reached: bool,
    pub heater_turned_off: bool,
    pub cron_scheduled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_temp_f: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_temp_f: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl CheckResult {
    /// The no-op result for an inactive session
    pub fn inactive() -> Self {
        Self::default()
    }

    pub fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Result of `start`: the new session plus its first evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartResult {
    pub started_at: DateTime<Utc>,
    #[serde(flatten)]
    pub check: CheckResult,
}

/// Result of a manual stop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopResult {
    pub was_active: bool,
    pub heater_turned_off: bool,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Snapshot for operators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub session: HeatingSession,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_temp_f: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heater_on: Option<bool>,
    #[serde(default)]
    pub pending_checks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}
