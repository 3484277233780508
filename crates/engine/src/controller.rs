// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heat-to-target control loop
//!
//! Every entry point is safe to invoke at any time, any number of times: an
//! invocation reads the persisted session, decides, and either reschedules
//! exactly one follow-up check or finishes and cleans up. Collaborator
//! failures are reported in the result and never abort cleanup.

use std::time::Duration;
use tracing::Instrument;
use tub_adapters::{CrontabAdapter, EquipmentStatus, EquipmentTrigger, TemperatureSource};
use tub_core::{
    CheckResult, Clock, Decision, EndReason, HeatingSession, IdGen, StartResult, StatusReport,
    StopResult, TargetBounds, TubConfig,
};
use tub_storage::{JobStore, SessionStore, StorageError};

use crate::{ControlError, JobChain};

/// Control loop settings
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub bounds: TargetBounds,
    pub check_interval: Duration,
    pub heater_on_event: String,
    pub heater_off_event: String,
}

impl ControllerConfig {
    pub fn from_config(config: &TubConfig) -> Self {
        Self {
            bounds: config.heat.bounds,
            check_interval: config.heat.check_interval,
            heater_on_event: config.heat.heater_on_event.clone(),
            heater_off_event: config.heat.heater_off_event.clone(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::from_config(&TubConfig::default())
    }
}

/// Collaborators the control loop drives
pub struct ControllerDeps<T, S, E, St> {
    pub trigger: T,
    pub sensor: S,
    pub status: E,
    pub store: St,
}

/// What the shared finish path managed to do
struct Finish {
    heater_turned_off: bool,
    persisted: bool,
}

pub struct HeatTargetController<T, S, E, St, X, C, I> {
    trigger: T,
    sensor: S,
    status: E,
    store: St,
    chain: JobChain<X, St, C, I>,
    clock: C,
    config: ControllerConfig,
}

impl<T, S, E, St, X, C, I> HeatTargetController<T, S, E, St, X, C, I>
where
    T: EquipmentTrigger,
    S: TemperatureSource,
    E: EquipmentStatus,
    St: SessionStore + JobStore,
    X: CrontabAdapter,
    C: Clock,
    I: IdGen,
{
    pub fn new(
        deps: ControllerDeps<T, S, E, St>,
        chain: JobChain<X, St, C, I>,
        clock: C,
        config: ControllerConfig,
    ) -> Self {
        Self {
            trigger: deps.trigger,
            sensor: deps.sensor,
            status: deps.status,
            store: deps.store,
            chain,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Current session record
    pub fn session(&self) -> Result<HeatingSession, StorageError> {
        self.store.load_session()
    }

    /// Begin heating toward `target_f`, then evaluate immediately.
    ///
    /// Starting while a session is active replaces it.
    pub async fn start(&self, target_f: f64) -> Result<StartResult, ControlError> {
        let target_f = self.config.bounds.check(target_f)?;
        let span = tracing::info_span!("heat.start", target_f);
        async move {
            let current = self.store.load_session()?;
            if current.active {
                tracing::info!(
                    previous_target_f = current.target_temp_f,
                    "replacing active session"
                );
            }

            let now = self.clock.now();
            let session = current.begin(target_f, now);
            self.store.save_session(&session)?;
            tracing::info!(version = session.version, "heating session started");

            let check = self.evaluate(session).await;
            Ok(StartResult {
                started_at: now,
                check,
            })
        }
        .instrument(span)
        .await
    }

    /// One evaluation of the loop, as fired by the scheduled check.
    ///
    /// A no-op when no session is active. When the session cannot be read,
    /// only a retry check is scheduled.
    pub async fn check_and_adjust(&self) -> CheckResult {
        let span = tracing::info_span!("heat.check");
        async move {
            match self.store.load_session() {
                Ok(session) => self.evaluate(session).await,
                Err(e) => {
                    // The session may still be heating; keep the chain alive
                    // without commanding the heater either way
                    tracing::error!(error = %e, "failed to load session; scheduling a retry");
                    let mut result = CheckResult::inactive();
                    result.push_error(format!("session load failed: {e}"));
                    match self.chain.schedule_next(self.config.check_interval).await {
                        Ok(check) => {
                            tracing::info!(job_id = %check.job_id, fires_at = %check.fires_at, "retry check scheduled");
                            result.cron_scheduled = true;
                            result.job_id = Some(check.job_id);
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "no follow-up check scheduled");
                            result.push_error(format!("scheduling failed: {e}"));
                        }
                    }
                    result
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Cancel the session: same cleanup as reaching the target
    pub async fn stop(&self) -> StopResult {
        let span = tracing::info_span!("heat.stop");
        async move {
            let mut errors = Vec::new();
            let session = match self.store.load_session() {
                Ok(session) => session,
                Err(e) => {
                    // Unknown state: clean up as if active
                    tracing::error!(error = %e, "failed to load session; forcing cleanup");
                    errors.push(format!("session load failed: {e}"));
                    let finish = self
                        .finish(&HeatingSession::idle(), EndReason::Stopped, &mut errors)
                        .await;
                    return StopResult {
                        was_active: false,
                        heater_turned_off: finish.heater_turned_off,
                        active: false,
                        errors,
                    };
                }
            };

            if !session.active {
                tracing::info!("no active session; sweeping stray checks");
                if let Err(e) = self.chain.cancel_all().await {
                    errors.push(format!("cron cleanup failed: {e}"));
                }
                return StopResult {
                    was_active: false,
                    heater_turned_off: false,
                    active: false,
                    errors,
                };
            }

            let finish = self.finish(&session, EndReason::Stopped, &mut errors).await;
            tracing::info!(heater_turned_off = finish.heater_turned_off, "heating session stopped");
            StopResult {
                was_active: true,
                heater_turned_off: finish.heater_turned_off,
                active: !finish.persisted,
                errors,
            }
        }
        .instrument(span)
        .await
    }

    /// Snapshot of session, temperature, heater and pending checks
    pub async fn status(&self) -> StatusReport {
        let mut errors = Vec::new();

        let session = self.store.load_session().unwrap_or_else(|e| {
            errors.push(format!("session load failed: {e}"));
            HeatingSession::idle()
        });
        let current_temp_f = self.sensor.latest_temperature_f().await.unwrap_or_else(|e| {
            errors.push(format!("temperature read failed: {e}"));
            None
        });
        let heater_on = match self.status.is_heater_on().await {
            Ok(on) => Some(on),
            Err(e) => {
                errors.push(format!("equipment status failed: {e}"));
                None
            }
        };
        let pending_checks = self.chain.pending().await.unwrap_or_else(|e| {
            errors.push(format!("crontab listing failed: {e}"));
            Vec::new()
        });

        StatusReport {
            session,
            current_temp_f,
            heater_on,
            pending_checks,
            errors,
        }
    }

    async fn evaluate(&self, session: HeatingSession) -> CheckResult {
        if !session.active {
            tracing::debug!("no active session; nothing to do");
            return CheckResult::inactive();
        }

        let mut result = CheckResult {
            active: true,
            target_temp_f: session.target_temp_f,
            ..CheckResult::default()
        };

        let reading = match self.sensor.latest_temperature_f().await {
            Ok(reading) => reading,
            Err(e) => {
                tracing::warn!(error = %e, "temperature read failed");
                result.push_error(format!("temperature read failed: {e}"));
                None
            }
        };
        result.current_temp_f = reading;

        match session.decide(reading) {
            Decision::NotActive => CheckResult::inactive(),
            Decision::TargetReached {
                current_f,
                target_f,
            } => {
                tracing::info!(current_f, target_f, "target reached");
                let finish = self
                    .finish(&session, EndReason::TargetReached, &mut result.errors)
                    .await;
                result.target_reached = true;
                result.heater_turned_off = finish.heater_turned_off;
                result.active = !finish.persisted;
                result
            }
            Decision::KeepHeating {
                current_f,
                target_f,
            } => {
                if current_f.is_none() {
                    tracing::warn!(target_f, "no usable temperature reading; continuing to heat");
                } else {
                    tracing::info!(current_f, target_f, "below target; heating");
                }
                result.heating = true;
                self.ensure_heater_on(&mut result).await;
                self.reschedule(&session, &mut result).await;
                result
            }
        }
    }

    async fn ensure_heater_on(&self, result: &mut CheckResult) {
        match self.status.is_heater_on().await {
            Ok(true) => {
                tracing::debug!("heater already on");
                return;
            }
            Ok(false) => {}
            Err(e) => {
                // Unknown state: command on again
                tracing::warn!(error = %e, "equipment status unknown");
                result.push_error(format!("equipment status failed: {e}"));
            }
        }

        match self.trigger.trigger(&self.config.heater_on_event).await {
            Ok(()) => {
                result.heater_turned_on = true;
                if let Err(e) = self.status.set_heater_on().await {
                    result.push_error(format!("equipment status update failed: {e}"));
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to turn heater on");
                result.push_error(format!("heater on failed: {e}"));
            }
        }
    }

    async fn reschedule(&self, session: &HeatingSession, result: &mut CheckResult) {
        let check = match self.chain.schedule_next(self.config.check_interval).await {
            Ok(check) => check,
            Err(e) => {
                tracing::error!(error = %e, "no follow-up check scheduled");
                result.push_error(format!("scheduling failed: {e}"));
                return;
            }
        };
        tracing::info!(job_id = %check.job_id, fires_at = %check.fires_at, "next check scheduled");
        result.cron_scheduled = true;
        result.job_id = Some(check.job_id);

        // A stop that slipped in while scheduling must not leave a check behind
        match self.store.load_session() {
            Ok(latest) if !latest.active => {
                tracing::warn!("session ended while scheduling; withdrawing check");
                if let Err(e) = self.chain.cancel_all().await {
                    result.push_error(format!("cron cleanup failed: {e}"));
                }
                result.cron_scheduled = false;
                result.job_id = None;
                result.heating = false;
                result.active = false;
                result.push_error("superseded: session ended during check");
            }
            Ok(latest) if latest.version != session.version => {
                // Restarted: the check just scheduled serves the new session
                tracing::info!(version = latest.version, "session replaced during check");
                result.target_temp_f = latest.target_temp_f;
                result.push_error("superseded: session replaced during check");
            }
            Ok(_) => {}
            Err(e) => result.push_error(format!("session re-check failed: {e}")),
        }
    }

    /// Shared terminal path: cancel, heater off, persist inactive, cancel again
    async fn finish(
        &self,
        session: &HeatingSession,
        reason: EndReason,
        errors: &mut Vec<String>,
    ) -> Finish {
        if let Err(e) = self.chain.cancel_all().await {
            tracing::error!(error = %e, "cron cleanup failed");
            errors.push(format!("cron cleanup failed: {e}"));
        }

        let mut heater_turned_off = false;
        match self.trigger.trigger(&self.config.heater_off_event).await {
            Ok(()) => {
                heater_turned_off = true;
                if let Err(e) = self.status.set_heater_off().await {
                    errors.push(format!("equipment status update failed: {e}"));
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to turn heater off");
                errors.push(format!("heater off failed: {e}"));
            }
        }

        let ended = session.end(reason, self.clock.now());
        let persisted = match self.store.save_session(&ended) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "failed to persist session end");
                errors.push(format!("session save failed: {e}"));
                false
            }
        };

        // A check added by a concurrent invocation between the two removals
        if let Err(e) = self.chain.cancel_all().await {
            errors.push(format!("cron cleanup (second pass) failed: {e}"));
        }

        tracing::info!(%reason, heater_turned_off, persisted, "heating session finished");
        Finish {
            heater_turned_off,
            persisted,
        }
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
