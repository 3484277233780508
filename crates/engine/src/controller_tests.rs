// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::{ChainConfig, JobChain};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::path::PathBuf;
use tub_adapters::{
    CrontabError, FakeCrontab, FakeEquipmentStatus, FakeTemperatureSource, FakeTrigger, StatusCall,
};
use tub_core::{FakeClock, RunnerCommand, SequentialIdGen, JOB_TAG};
use tub_storage::MemoryStore;

const ON: &str = "hot-tub-heat-on";
const OFF: &str = "hot-tub-heat-off";
const INTERVAL: Duration = Duration::from_secs(15 * 60);

struct Harness {
    controller: HeatTargetController<
        FakeTrigger,
        FakeTemperatureSource,
        FakeEquipmentStatus,
        MemoryStore,
        FakeCrontab,
        FakeClock,
        SequentialIdGen,
    >,
    trigger: FakeTrigger,
    sensor: FakeTemperatureSource,
    status: FakeEquipmentStatus,
    store: MemoryStore,
    crontab: FakeCrontab,
    clock: FakeClock,
}

fn chain_config(token: &str) -> ChainConfig {
    ChainConfig {
        base_url: "http://127.0.0.1:8480".to_string(),
        endpoint: "/api/heat-to-target/check".to_string(),
        auth_token: token.to_string(),
        runner: RunnerCommand {
            program: PathBuf::from("tub"),
            config_path: None,
            state_dir: None,
            log_path: None,
        },
    }
}

fn build(crontab: FakeCrontab, token: &str) -> Harness {
    let trigger = FakeTrigger::new();
    let sensor = FakeTemperatureSource::new();
    let status = FakeEquipmentStatus::new();
    let store = MemoryStore::new();
    let clock = FakeClock::at(Utc.with_ymd_and_hms(2026, 1, 25, 18, 0, 0).unwrap());

    let chain = JobChain::new(
        crontab.clone(),
        store.clone(),
        clock.clone(),
        SequentialIdGen::new("t"),
        chain_config(token),
    );
    let controller = HeatTargetController::new(
        ControllerDeps {
            trigger: trigger.clone(),
            sensor: sensor.clone(),
            status: status.clone(),
            store: store.clone(),
        },
        chain,
        clock.clone(),
        ControllerConfig {
            bounds: TargetBounds::default(),
            check_interval: INTERVAL,
            heater_on_event: ON.to_string(),
            heater_off_event: OFF.to_string(),
        },
    );

    Harness {
        controller,
        trigger,
        sensor,
        status,
        store,
        crontab,
        clock,
    }
}

fn harness() -> Harness {
    let crontab = FakeCrontab::new().with_line("0 3 * * * /usr/bin/backup.sh");
    build(crontab, "svc-token")
}

impl Harness {
    fn tagged_lines(&self) -> usize {
        self.crontab.matching(JOB_TAG).len()
    }

    fn assert_cleaned_up(&self) {
        assert!(!self.store.session().active, "session still active");
        assert_eq!(self.tagged_lines(), 0, "tagged crontab lines remain");
        assert!(self.store.descriptors().is_empty(), "descriptors remain");
    }
}

// =============================================================================
// start
// =============================================================================

#[tokio::test]
async fn start_below_target_turns_heater_on_and_schedules() {
    let h = harness();
    h.sensor.set(Some(82.0));

    let result = h.controller.start(103.5).await.unwrap();

    assert_eq!(result.started_at, h.clock.now());
    assert!(result.check.active);
    assert!(result.check.heating);
    assert!(result.check.heater_turned_on);
    assert!(result.check.cron_scheduled);
    assert_eq!(result.check.target_temp_f, Some(103.5));
    assert_eq!(result.check.current_temp_f, Some(82.0));
    assert!(result.check.is_clean(), "{:?}", result.check.errors);

    assert_eq!(h.trigger.calls(), vec![ON]);
    assert!(h.status.heater_on());
    assert_eq!(h.tagged_lines(), 1);
    assert_eq!(h.store.session().target_temp_f, Some(103.5));
}

#[tokio::test]
async fn start_at_or_above_target_finishes_immediately() {
    let h = harness();
    h.sensor.set(Some(104.0));

    let result = h.controller.start(103.5).await.unwrap();

    assert!(result.check.target_reached);
    assert!(result.check.heater_turned_off);
    assert!(!result.check.active);
    assert!(!result.check.cron_scheduled);
    assert_eq!(h.trigger.calls(), vec![OFF]);
    h.assert_cleaned_up();
}

#[yare::parameterized(
    too_cold = { 79.0 },
    too_hot = { 111.0 },
    scalding = { 150.0 },
    nan = { f64::NAN },
)]
#[test_macro(tokio::test)]
async fn start_rejects_out_of_range_target(target: f64) {
    let h = harness();
    h.sensor.set(Some(82.0));

    let err = h.controller.start(target).await.unwrap_err();

    assert!(matches!(err, ControlError::InvalidTarget(_)));
    assert!(h.trigger.calls().is_empty());
    assert!(h.crontab.calls().is_empty());
    assert_eq!(h.store.session_saves(), 0);
}

#[tokio::test]
async fn start_fails_when_store_is_down() {
    let h = harness();
    h.store.set_fail_saves(true);

    let err = h.controller.start(103.5).await.unwrap_err();

    assert!(matches!(err, ControlError::Storage(_)));
    assert!(h.trigger.calls().is_empty());
    assert!(h.crontab.calls().is_empty());
}

#[tokio::test]
async fn start_while_active_replaces_target_and_keeps_one_entry() {
    let h = harness();
    h.sensor.set(Some(85.0));
    h.controller.start(100.0).await.unwrap();

    let result = h.controller.start(104.0).await.unwrap();

    assert_eq!(result.check.target_temp_f, Some(104.0));
    assert!(!result.check.heater_turned_on, "heater was already on");
    assert_eq!(h.store.session().version, 2);
    assert_eq!(h.tagged_lines(), 1);
    assert_eq!(h.trigger.count(ON), 1);
}

// =============================================================================
// check_and_adjust
// =============================================================================

#[tokio::test]
async fn check_without_session_is_a_noop() {
    let h = harness();
    h.sensor.set(Some(90.0));

    let first = h.controller.check_and_adjust().await;
    let second = h.controller.check_and_adjust().await;

    for result in [first, second] {
        assert_eq!(result, CheckResult::inactive());
    }
    assert!(h.trigger.calls().is_empty());
    assert!(h.crontab.calls().is_empty());
    assert_eq!(h.store.session_saves(), 0);
}

#[tokio::test]
async fn repeated_checks_keep_exactly_one_entry() {
    let h = harness();
    h.sensor.set(Some(82.0));
    h.controller.start(103.5).await.unwrap();

    for i in 0..6 {
        h.clock.advance(INTERVAL);
        h.sensor.set(Some(83.0 + i as f64));
        let result = h.controller.check_and_adjust().await;
        assert!(result.cron_scheduled);
        assert_eq!(h.tagged_lines(), 1);
        assert_eq!(h.store.descriptors().len(), 1);
    }
    assert_eq!(h.trigger.count(ON), 1);
}

#[tokio::test]
async fn heater_already_on_is_not_retriggered() {
    let h = harness();
    h.sensor.set(Some(95.0));
    h.controller.start(103.5).await.unwrap();
    let before = h.trigger.calls().len();

    let result = h.controller.check_and_adjust().await;

    assert!(result.heating);
    assert!(!result.heater_turned_on);
    assert!(result.cron_scheduled);
    assert_eq!(h.trigger.calls().len(), before);
}

#[tokio::test]
async fn heater_on_before_start_is_not_triggered() {
    let h = harness();
    h.status.set_heater_on().await.unwrap();
    h.sensor.set(Some(88.0));

    let result = h.controller.start(103.5).await.unwrap();

    assert!(result.check.heating);
    assert!(!result.check.heater_turned_on);
    assert!(result.check.cron_scheduled);
    assert!(h.trigger.calls().is_empty());
}

#[tokio::test]
async fn sensor_dropout_keeps_heating_and_reschedules() {
    let h = harness();
    h.sensor.set(Some(90.0));
    h.controller.start(103.5).await.unwrap();

    h.sensor.set(None);
    let result = h.controller.check_and_adjust().await;

    assert!(result.active);
    assert!(result.heating);
    assert!(result.cron_scheduled);
    assert_eq!(result.current_temp_f, None);
    assert_eq!(h.trigger.count(OFF), 0);
    assert_eq!(h.tagged_lines(), 1);
}

#[tokio::test]
async fn sensor_error_is_reported_and_treated_as_no_reading() {
    let h = harness();
    h.sensor.set(Some(90.0));
    h.controller.start(103.5).await.unwrap();

    h.sensor.set_fail(true);
    let result = h.controller.check_and_adjust().await;

    assert!(result.heating);
    assert!(result.cron_scheduled);
    assert!(result.errors.iter().any(|e| e.contains("temperature read failed")));
    assert_eq!(h.trigger.count(OFF), 0);
}

#[tokio::test]
async fn target_reached_removes_entries_twice() {
    let h = harness();
    h.sensor.set(Some(100.0));
    h.controller.start(103.5).await.unwrap();
    h.crontab.clear_calls();

    h.sensor.set(Some(103.6));
    let result = h.controller.check_and_adjust().await;

    assert!(result.target_reached);
    assert!(result.heater_turned_off);
    assert!(!result.active);
    assert!(!result.cron_scheduled);
    assert_eq!(h.crontab.removals(), 2);
    assert_eq!(h.crontab.adds(), 0);
    assert_eq!(h.status.calls().last(), Some(&StatusCall::SetOff));
    h.assert_cleaned_up();
    assert_eq!(h.store.session().end_reason, Some(EndReason::TargetReached));
}

#[tokio::test]
async fn heater_off_failure_still_cleans_up() {
    let h = harness();
    h.sensor.set(Some(100.0));
    h.controller.start(103.5).await.unwrap();

    h.trigger.fail_event(OFF, true);
    h.sensor.set(Some(104.0));
    let result = h.controller.check_and_adjust().await;

    assert!(result.target_reached);
    assert!(!result.heater_turned_off);
    assert!(result.errors.iter().any(|e| e.contains("heater off failed")));
    // Status only changes on a confirmed off
    assert!(h.status.heater_on());
    h.assert_cleaned_up();
}

#[tokio::test]
async fn save_failure_on_terminal_path_still_removes_entries() {
    let h = harness();
    h.sensor.set(Some(100.0));
    h.controller.start(103.5).await.unwrap();

    h.store.set_fail_saves(true);
    h.sensor.set(Some(104.0));
    let result = h.controller.check_and_adjust().await;

    assert!(result.target_reached);
    assert!(result.active, "session could not be persisted inactive");
    assert!(result.errors.iter().any(|e| e.contains("session save failed")));
    assert_eq!(h.tagged_lines(), 0);
}

#[tokio::test]
async fn heater_on_failure_still_reschedules() {
    let h = harness();
    h.trigger.fail_event(ON, true);
    h.sensor.set(Some(82.0));

    let result = h.controller.start(103.5).await.unwrap();

    assert!(result.check.heating);
    assert!(!result.check.heater_turned_on);
    assert!(result.check.cron_scheduled);
    assert!(!h.status.heater_on());

    // Next check retries the heater
    h.trigger.fail_event(ON, false);
    let retry = h.controller.check_and_adjust().await;
    assert!(retry.heater_turned_on);
}

#[tokio::test]
async fn scheduling_failure_is_reported() {
    let h = harness();
    h.crontab.set_fail_add(true);
    h.sensor.set(Some(82.0));

    let result = h.controller.start(103.5).await.unwrap();

    assert!(result.check.active);
    assert!(result.check.heating);
    assert!(!result.check.cron_scheduled);
    assert_eq!(result.check.job_id, None);
    assert!(result.check.errors.iter().any(|e| e.contains("scheduling failed")));
}

#[tokio::test]
async fn load_failure_schedules_retry_without_touching_heater() {
    let h = harness();
    h.store.set_fail_loads(true);

    let result = h.controller.check_and_adjust().await;

    assert!(!result.active);
    assert!(!result.heating);
    assert!(result.cron_scheduled);
    assert!(result.job_id.is_some());
    assert!(result.errors.iter().any(|e| e.contains("session load failed")));
    assert!(h.trigger.calls().is_empty());
    assert_eq!(h.tagged_lines(), 1);
    assert_eq!(h.store.descriptors().len(), 1);
}

#[tokio::test]
async fn load_failure_mid_session_keeps_chain_alive() {
    let h = harness();
    h.sensor.set(Some(82.0));
    let started = h.controller.start(103.5).await.unwrap();
    let fired = started.check.job_id.unwrap();

    // The runner consumes the line that fired, then the store goes bad
    h.crontab.remove_by_pattern(fired.as_str()).await.unwrap();
    h.store.set_fail_loads(true);
    let triggers = h.trigger.calls().len();

    let result = h.controller.check_and_adjust().await;

    assert!(result.cron_scheduled);
    assert_ne!(result.job_id, Some(fired));
    assert_eq!(h.tagged_lines(), 1);
    assert_eq!(h.trigger.calls().len(), triggers);
    assert!(h.store.session().active);

    // Once the store recovers, the retry picks the session back up
    h.store.set_fail_loads(false);
    h.sensor.set(Some(104.0));
    let result = h.controller.check_and_adjust().await;
    assert!(result.target_reached);
    h.assert_cleaned_up();
}

#[tokio::test]
async fn late_firing_after_finish_is_a_noop() {
    let h = harness();
    h.sensor.set(Some(100.0));
    h.controller.start(103.5).await.unwrap();
    h.sensor.set(Some(104.0));
    h.controller.check_and_adjust().await;
    let triggers = h.trigger.calls().len();
    let saves = h.store.session_saves();
    h.crontab.clear_calls();

    // The already-removed job fires anyway
    let result = h.controller.check_and_adjust().await;

    assert_eq!(result, CheckResult::inactive());
    assert_eq!(h.trigger.calls().len(), triggers);
    assert_eq!(h.store.session_saves(), saves);
    assert!(h.crontab.calls().is_empty());
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn every_scheduled_check_carries_the_credential() {
    let h = harness();
    h.sensor.set(Some(82.0));
    h.controller.start(103.5).await.unwrap();

    for _ in 0..3 {
        h.controller.check_and_adjust().await;
        for descriptor in h.store.descriptors() {
            assert!(descriptor.has_credential());
            assert_eq!(descriptor.authorization(), "Bearer svc-token");
        }
    }
}

#[tokio::test]
async fn missing_credential_schedules_nothing() {
    let h = build(FakeCrontab::new(), "");
    h.sensor.set(Some(82.0));

    let result = h.controller.start(103.5).await.unwrap();

    assert!(!result.check.cron_scheduled);
    assert!(result.check.errors.iter().any(|e| e.contains("credential")));
    assert_eq!(h.crontab.adds(), 0);
    assert!(h.store.descriptors().is_empty());
}

// =============================================================================
// stop / status
// =============================================================================

#[tokio::test]
async fn stop_shares_the_finish_path() {
    let h = harness();
    h.sensor.set(Some(90.0));
    h.controller.start(103.5).await.unwrap();
    h.crontab.clear_calls();

    let result = h.controller.stop().await;

    assert!(result.was_active);
    assert!(result.heater_turned_off);
    assert!(!result.active);
    assert_eq!(h.crontab.removals(), 2);
    assert_eq!(h.trigger.calls().last().map(String::as_str), Some(OFF));
    assert_eq!(h.store.session().end_reason, Some(EndReason::Stopped));
    h.assert_cleaned_up();
}

#[tokio::test]
async fn stop_when_idle_sweeps_once() {
    let h = harness();

    let result = h.controller.stop().await;

    assert!(!result.was_active);
    assert!(!result.heater_turned_off);
    assert_eq!(h.crontab.removals(), 1);
    assert!(h.trigger.calls().is_empty());
    assert_eq!(h.store.session_saves(), 0);
}

#[tokio::test]
async fn stop_with_unreadable_session_forces_heater_off() {
    let h = harness();
    h.store.set_fail_loads(true);

    let result = h.controller.stop().await;

    assert!(result.heater_turned_off);
    assert_eq!(h.trigger.calls(), vec![OFF]);
    assert!(!result.errors.is_empty());
}

#[tokio::test]
async fn status_reports_session_and_pending_check() {
    let h = harness();
    h.sensor.set(Some(90.0));
    h.controller.start(103.5).await.unwrap();

    let report = h.controller.status().await;

    assert!(report.session.active);
    assert_eq!(report.current_temp_f, Some(90.0));
    assert_eq!(report.heater_on, Some(true));
    assert_eq!(report.pending_checks.len(), 1);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn status_collects_collaborator_errors() {
    let h = harness();
    h.sensor.set_fail(true);
    h.status.set_fail(true);

    let report = h.controller.status().await;

    assert!(!report.session.active);
    assert_eq!(report.heater_on, None);
    assert_eq!(report.errors.len(), 2);
}

// =============================================================================
// Concurrent stop while scheduling
// =============================================================================

/// Crontab that ends the session as soon as an entry is added, like a stop
/// request landing between scheduling and the re-check.
#[derive(Clone)]
struct StopOnAdd {
    inner: FakeCrontab,
    store: MemoryStore,
}

#[async_trait]
impl CrontabAdapter for StopOnAdd {
    async fn add_entry(&self, line: &str) -> Result<(), CrontabError> {
        self.inner.add_entry(line).await?;
        let session = self.store.load_session().unwrap();
        if session.active {
            let ended = session.end(EndReason::Stopped, Utc::now());
            self.store.save_session(&ended).unwrap();
        }
        Ok(())
    }

    async fn remove_by_pattern(&self, pattern: &str) -> Result<usize, CrontabError> {
        self.inner.remove_by_pattern(pattern).await
    }

    async fn list_entries(&self) -> Result<Vec<String>, CrontabError> {
        self.inner.list_entries().await
    }
}

#[tokio::test]
async fn check_withdrawn_when_session_ends_during_scheduling() {
    let crontab = FakeCrontab::new();
    let trigger = FakeTrigger::new();
    let sensor = FakeTemperatureSource::reading(90.0);
    let store = MemoryStore::new();
    let clock = FakeClock::new();
    let stop_on_add = StopOnAdd {
        inner: crontab.clone(),
        store: store.clone(),
    };
    let controller = HeatTargetController::new(
        ControllerDeps {
            trigger,
            sensor,
            status: FakeEquipmentStatus::new(),
            store: store.clone(),
        },
        JobChain::new(
            stop_on_add,
            store.clone(),
            clock.clone(),
            SequentialIdGen::new("t"),
            chain_config("svc-token"),
        ),
        clock,
        ControllerConfig::default(),
    );

    let result = controller.start(103.5).await.unwrap();

    assert!(!result.check.cron_scheduled);
    assert!(!result.check.active);
    assert!(result.check.errors.iter().any(|e| e.starts_with("superseded")));
    assert!(crontab.matching(JOB_TAG).is_empty());
    assert!(store.descriptors().is_empty());
}

// =============================================================================
// Full cycle
// =============================================================================

#[tokio::test]
async fn full_cycle_from_cold_to_target() {
    let h = harness();
    let start_f = 82.0;
    let rate_per_min = 0.5;
    let temp_at = |minute: u64| start_f + rate_per_min * minute as f64;

    h.sensor.set(Some(temp_at(0)));
    let started = h.controller.start(103.5).await.unwrap();
    assert!(started.check.heater_turned_on);

    for minute in [15, 30] {
        h.sensor.set(Some(temp_at(minute)));
        let result = h.controller.check_and_adjust().await;
        assert!(result.heating && result.cron_scheduled, "minute {minute}");
    }

    // Minute 40: 102°F, still below target
    h.sensor.set(Some(temp_at(40)));
    let result = h.controller.check_and_adjust().await;
    assert!(result.heating);
    assert!(!result.heater_turned_on);
    assert_eq!(result.current_temp_f, Some(102.0));

    // Minute 45: 104.5°F
    h.sensor.set(Some(temp_at(45)));
    let result = h.controller.check_and_adjust().await;
    assert!(result.target_reached);
    assert!(result.heater_turned_off);

    assert_eq!(h.trigger.calls(), vec![ON, OFF]);
    h.assert_cleaned_up();
    assert_eq!(h.crontab.lines(), vec!["0 3 * * * /usr/bin/backup.sh"]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn terminates_within_bounded_checks(
        target in 80.0f64..=110.0,
        below in 0.5f64..40.0,
        rise in 0.1f64..5.0,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let h = harness();
            let mut temp = target - below;
            h.sensor.set(Some(temp));
            let mut result = h.controller.start(target).await.unwrap().check;

            let bound = (below / rise).ceil() as usize + 1;
            let mut checks = 0;
            while result.active {
                prop_assert!(checks <= bound, "no termination after {} checks", checks);
                prop_assert_eq!(h.tagged_lines(), 1);
                temp += rise;
                h.sensor.set(Some(temp));
                h.clock.advance(INTERVAL);
                result = h.controller.check_and_adjust().await;
                checks += 1;
            }

            prop_assert!(result.target_reached);
            prop_assert_eq!(h.trigger.count(ON), 1);
            prop_assert_eq!(h.trigger.count(OFF), 1);
            prop_assert_eq!(h.tagged_lines(), 0);
            prop_assert!(h.store.descriptors().is_empty());
            Ok(())
        })?;
    }
}
