// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heat-to-target commands

use clap::{Args, Subcommand};
use serde_json::json;
use tub_core::{CheckResult, StartResult, StatusReport, StopResult, TubConfig};

use crate::client::ApiClient;
use crate::error::TubError;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct HeatArgs {
    #[command(subcommand)]
    pub command: HeatCommand,
}

#[derive(Subcommand)]
pub enum HeatCommand {
    /// Heat the tub to a target temperature, then turn the heater off
    Start {
        /// Target water temperature in °F
        target_temp_f: f64,
    },
    /// Cancel heating and turn the heater off
    Stop,
    /// Show session, temperature, heater and scheduled checks
    Status,
    /// Run one evaluation now (what each scheduled check does)
    Check,
}

pub async fn handle(
    command: HeatCommand,
    config: &TubConfig,
    format: OutputFormat,
) -> Result<(), TubError> {
    let client = ApiClient::from_config(config)
        .map_err(|e| TubError::from_client(&config.base_url, e))?;
    let fail = |e| TubError::from_client(client.base_url(), e);

    match command {
        HeatCommand::Start { target_temp_f } => {
            let result: StartResult = client
                .post(
                    "/api/heat-to-target/start",
                    Some(json!({ "target_temp_f": target_temp_f })),
                )
                .await
                .map_err(fail)?;
            output::print(&result, format, render_start);
        }
        HeatCommand::Stop => {
            let result: StopResult = client
                .post("/api/heat-to-target/stop", None)
                .await
                .map_err(fail)?;
            output::print(&result, format, render_stop);
        }
        HeatCommand::Status => {
            let report: StatusReport = client
                .get("/api/heat-to-target/status")
                .await
                .map_err(fail)?;
            output::print(&report, format, render_status);
        }
        HeatCommand::Check => {
            let result: CheckResult = client
                .post("/api/heat-to-target/check", None)
                .await
                .map_err(fail)?;
            output::print(&result, format, render_check);
        }
    }
    Ok(())
}

pub fn render_start(result: &StartResult) -> Vec<String> {
    let mut lines = vec![format!(
        "Heating to {} (started {})",
        output::temp(result.check.target_temp_f),
        result.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    )];
    lines.extend(render_check(&result.check));
    lines
}

pub fn render_check(result: &CheckResult) -> Vec<String> {
    let mut lines = Vec::new();
    if result.target_reached {
        lines.push(format!(
            "Target reached at {}; heater {}",
            output::temp(result.current_temp_f),
            if result.heater_turned_off {
                "turned off"
            } else {
                "NOT confirmed off"
            }
        ));
    } else if result.heating {
        lines.push(format!(
            "Heating: {} -> {}",
            output::temp(result.current_temp_f),
            output::temp(result.target_temp_f)
        ));
        if result.heater_turned_on {
            lines.push("Heater turned on".to_string());
        }
        match &result.job_id {
            Some(job_id) if result.cron_scheduled => {
                lines.push(format!("Next check scheduled ({})", job_id))
            }
            _ => lines.push("No follow-up check scheduled".to_string()),
        }
    } else if !result.active {
        lines.push("No active heating session".to_string());
    }
    lines.extend(render_errors(&result.errors));
    lines
}

pub fn render_stop(result: &StopResult) -> Vec<String> {
    let mut lines = Vec::new();
    if result.was_active {
        lines.push(format!(
            "Heating stopped; heater {}",
            if result.heater_turned_off {
                "turned off"
            } else {
                "NOT confirmed off"
            }
        ));
    } else {
        lines.push("No active heating session".to_string());
    }
    if result.active {
        lines.push("Session could not be marked inactive".to_string());
    }
    lines.extend(render_errors(&result.errors));
    lines
}

pub fn render_status(report: &StatusReport) -> Vec<String> {
    let session = &report.session;
    let mut lines = Vec::new();
    if session.active {
        lines.push(format!(
            "Session:     heating to {}",
            output::temp(session.target_temp_f)
        ));
        if let Some(started_at) = session.started_at {
            lines.push(format!(
                "Started:     {}",
                started_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }
    } else {
        let last = match (session.end_reason, session.ended_at) {
            (Some(reason), Some(at)) => {
                format!(" (last: {} at {})", reason, at.format("%Y-%m-%d %H:%M:%S UTC"))
            }
            _ => String::new(),
        };
        lines.push(format!("Session:     idle{}", last));
    }
    lines.push(format!(
        "Water:       {}",
        output::temp(report.current_temp_f)
    ));
    lines.push(format!("Heater on:   {}", output::yes_no(report.heater_on)));
    if report.pending_checks.is_empty() {
        lines.push("Scheduled:   none".to_string());
    } else {
        lines.push("Scheduled:".to_string());
        for line in &report.pending_checks {
            lines.push(format!("  {}", line));
        }
    }
    lines.extend(render_errors(&report.errors));
    lines
}

fn render_errors(errors: &[String]) -> Vec<String> {
    errors.iter().map(|e| format!("warning: {}", e)).collect()
}

#[cfg(test)]
#[path = "heat_tests.rs"]
mod tests;
