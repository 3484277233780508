// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The seam between HTTP routes and the control loop

use async_trait::async_trait;
use tokio::sync::Mutex;
use tub_adapters::{
    CrontabAdapter, DryRunTrigger, EquipmentStatus, EquipmentTrigger, IftttTrigger,
    TemperatureSource, TriggerError,
};
use tub_core::{CheckResult, Clock, IdGen, StartResult, StatusReport, StopResult};
use tub_engine::{ControlError, HeatTargetController};
use tub_storage::{JobStore, SessionStore};

/// Control-loop operations as the routes see them
#[async_trait]
pub trait HeatControl: Send + Sync + 'static {
    async fn start(&self, target_f: f64) -> Result<StartResult, ControlError>;
    async fn check(&self) -> CheckResult;
    async fn stop(&self) -> StopResult;
    async fn status(&self) -> StatusReport;
    /// Whether a session is active; an unreadable record counts as idle
    async fn is_active(&self) -> bool;
}

#[async_trait]
impl<T, S, E, St, X, C, I> HeatControl for Mutex<HeatTargetController<T, S, E, St, X, C, I>>
where
    T: EquipmentTrigger,
    S: TemperatureSource,
    E: EquipmentStatus,
    St: SessionStore + JobStore,
    X: CrontabAdapter,
    C: Clock + 'static,
    I: IdGen + 'static,
{
    async fn start(&self, target_f: f64) -> Result<StartResult, ControlError> {
        self.lock().await.start(target_f).await
    }

    async fn check(&self) -> CheckResult {
        self.lock().await.check_and_adjust().await
    }

    async fn stop(&self) -> StopResult {
        self.lock().await.stop().await
    }

    async fn status(&self) -> StatusReport {
        self.lock().await.status().await
    }

    async fn is_active(&self) -> bool {
        match self.lock().await.session() {
            Ok(session) => session.active,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load session");
                false
            }
        }
    }
}

/// Equipment trigger chosen by `equipment.dry_run`
#[derive(Clone, Debug)]
pub enum DaemonTrigger {
    Ifttt(IftttTrigger),
    DryRun(DryRunTrigger),
}

#[async_trait]
impl EquipmentTrigger for DaemonTrigger {
    async fn trigger(&self, event: &str) -> Result<(), TriggerError> {
        match self {
            DaemonTrigger::Ifttt(inner) => inner.trigger(event).await,
            DaemonTrigger::DryRun(inner) => inner.trigger(event).await,
        }
    }
}
