// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tub_core::{EndReason, HeatingSession, JobId};

fn heating() -> CheckResult {
    CheckResult {
        active: true,
        heating: true,
        heater_turned_on: true,
        cron_scheduled: true,
        current_temp_f: Some(82.0),
        target_temp_f: Some(104.0),
        job_id: JobId::parse("heat-target-0123456789ab"),
        ..CheckResult::default()
    }
}

#[test]
fn heating_check_names_next_job() {
    let lines = render_check(&heating());
    assert_eq!(lines[0], "Heating: 82.0°F -> 104.0°F");
    assert_eq!(lines[1], "Heater turned on");
    assert_eq!(lines[2], "Next check scheduled (heat-target-0123456789ab)");
}

#[test]
fn failed_reschedule_is_visible() {
    let result = CheckResult {
        cron_scheduled: false,
        job_id: None,
        errors: vec!["scheduling failed: crontab error".to_string()],
        ..heating()
    };
    let lines = render_check(&result);
    assert!(lines.contains(&"No follow-up check scheduled".to_string()));
    assert!(lines.contains(&"warning: scheduling failed: crontab error".to_string()));
}

#[test]
fn target_reached_reports_heater_state() {
    let result = CheckResult {
        target_reached: true,
        heater_turned_off: false,
        current_temp_f: Some(104.2),
        ..CheckResult::default()
    };
    assert_eq!(
        render_check(&result)[0],
        "Target reached at 104.2°F; heater NOT confirmed off"
    );
}

#[test]
fn idle_check_says_so() {
    assert_eq!(
        render_check(&CheckResult::inactive()),
        vec!["No active heating session".to_string()]
    );
}

#[test]
fn stop_of_idle_session() {
    let lines = render_stop(&StopResult::default());
    assert_eq!(lines, vec!["No active heating session".to_string()]);
}

#[test]
fn idle_status_shows_last_outcome() {
    let now = chrono::Utc::now();
    let session = HeatingSession::idle()
        .begin(104.0, now)
        .end(EndReason::TargetReached, now);
    let report = StatusReport {
        session,
        current_temp_f: Some(104.1),
        heater_on: Some(false),
        pending_checks: Vec::new(),
        errors: Vec::new(),
    };

    let lines = render_status(&report);
    assert!(lines[0].starts_with("Session:     idle (last: target reached at "));
    assert_eq!(lines[1], "Water:       104.1°F");
    assert_eq!(lines[2], "Heater on:   no");
    assert_eq!(lines[3], "Scheduled:   none");
}

#[test]
fn active_status_lists_pending_checks() {
    let now = chrono::Utc::now();
    let report = StatusReport {
        session: HeatingSession::idle().begin(102.0, now),
        current_temp_f: None,
        heater_on: None,
        pending_checks: vec!["19 14 25 1 * tub job run heat-target-1 # heat-target-1".to_string()],
        errors: vec!["temperature read failed: sensor unavailable".to_string()],
    };

    let lines = render_status(&report);
    assert_eq!(lines[0], "Session:     heating to 102.0°F");
    assert!(lines.contains(&"Water:       -".to_string()));
    assert!(lines.contains(&"Heater on:   unknown".to_string()));
    assert!(lines.contains(&"  19 14 25 1 * tub job run heat-target-1 # heat-target-1".to_string()));
    assert!(lines.contains(&"warning: temperature read failed: sensor unavailable".to_string()));
}
