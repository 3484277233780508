// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, reconciliation.

use std::fs::File;
use std::sync::Arc;

use fs2::FileExt;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{info, warn};
use tub_adapters::{
    DryRunTrigger, IftttTrigger, JsonEquipmentStatus, ReadingFileSource, SystemCrontab,
    TracedCrontab, TracedTrigger,
};
use tub_core::{ConfigError, StatusReport, SystemClock, TubConfig, UuidIdGen};
use tub_engine::{ChainConfig, ControllerConfig, ControllerDeps, HeatTargetController, JobChain};
use tub_storage::{JsonStore, StorageError};

use crate::control::DaemonTrigger;
use crate::routes::{router, AppState};

/// Controller with concrete adapter types (wrapped with tracing)
pub type DaemonController = HeatTargetController<
    TracedTrigger<DaemonTrigger>,
    ReadingFileSource<SystemClock>,
    JsonEquipmentStatus<SystemClock>,
    JsonStore,
    TracedCrontab<SystemCrontab>,
    SystemClock,
    UuidIdGen,
>;

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind {0}: {1}")]
    BindFailed(String, std::io::Error),

    #[error("state store error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Running daemon
pub struct Daemon {
    pub config: TubConfig,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    lock_file: File,
    pub listener: TcpListener,
    pub state: Arc<AppState<Mutex<DaemonController>>>,
}

impl Daemon {
    /// Serve HTTP until `shutdown` resolves, then clean up
    pub async fn run<F>(self, shutdown: F) -> Result<(), LifecycleError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let Daemon {
            config,
            lock_file,
            listener,
            state,
        } = self;

        let app = router(state)?;
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        shutdown_cleanup(&config);
        drop(lock_file);
        Ok(served?)
    }
}

/// Remove the PID file; scheduled checks stay in the crontab and call back
/// once the daemon is up again
fn shutdown_cleanup(config: &TubConfig) {
    info!("Shutting down daemon...");

    let pid_path = config.pid_path();
    if pid_path.exists() {
        if let Err(e) = std::fs::remove_file(&pid_path) {
            warn!("Failed to remove PID file: {}", e);
        }
    }

    info!("Daemon shutdown complete");
}

/// Start the daemon
pub async fn startup(config: &TubConfig) -> Result<Daemon, LifecycleError> {
    match startup_inner(config).await {
        Ok(daemon) => Ok(daemon),
        Err(e) => {
            // The PID file belongs to whoever holds the lock
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &TubConfig) -> Result<Daemon, LifecycleError> {
    // 1. Validate before touching anything: the token guards every scheduled check
    config.validate()?;
    config.require_token()?;

    // 2. Acquire lock file FIRST - prevents two daemons fighting over the crontab
    std::fs::create_dir_all(&config.state_dir)?;
    let lock_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(config.pid_path())?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    // Write PID only once the lock is ours
    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Open state and build the controller
    let store = JsonStore::open(&config.state_dir)?;
    let controller = build_controller(config, store);

    // 4. Reconcile with the crontab (log only)
    let report = controller.status().await;
    info!(
        active = report.session.active,
        pending_checks = report.pending_checks.len(),
        "Loaded heating session"
    );
    if let Some(drift) = reconcile(&report) {
        warn!("{}", drift);
    }

    // 5. Bind LAST - only after all validation passes
    let listener = TcpListener::bind(&config.listen)
        .await
        .map_err(|e| LifecycleError::BindFailed(config.listen.clone(), e))?;

    let state = Arc::new(AppState::new(Mutex::new(controller), config.clone()));

    info!(listen = %config.listen, state_dir = %config.state_dir.display(), "Daemon started");

    Ok(Daemon {
        config: config.clone(),
        lock_file,
        listener,
        state,
    })
}

/// Wire production adapters into a controller
pub fn build_controller(config: &TubConfig, store: JsonStore) -> DaemonController {
    let trigger = if config.equipment.dry_run {
        warn!("equipment dry run: heater commands are logged, not sent");
        DaemonTrigger::DryRun(DryRunTrigger::new())
    } else {
        DaemonTrigger::Ifttt(IftttTrigger::new(
            config.equipment.ifttt_base_url.clone(),
            config.equipment.ifttt_key.clone().unwrap_or_default(),
            config.equipment.timeout,
        ))
    };

    let crontab = TracedCrontab::new(
        SystemCrontab::new().with_backups(config.crontab_backup_dir(), config.runner.keep_backups),
    );
    let chain = JobChain::new(
        crontab,
        store.clone(),
        SystemClock,
        UuidIdGen,
        ChainConfig::from_config(config),
    );

    HeatTargetController::new(
        ControllerDeps {
            trigger: TracedTrigger::new(trigger),
            sensor: ReadingFileSource::new(
                config.reading_path(),
                config.sensor.max_age,
                SystemClock,
            ),
            status: JsonEquipmentStatus::new(config.equipment_status_path(), SystemClock),
            store,
        },
        chain,
        SystemClock,
        ControllerConfig::from_config(config),
    )
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &TubConfig) {
    let pid_path = config.pid_path();
    if pid_path.exists() {
        let _ = std::fs::remove_file(&pid_path);
    }
}

/// Mismatch between the session record and the crontab found at startup
#[derive(Debug, Clone, PartialEq)]
pub enum Drift {
    /// Active session but nothing will call back
    ActiveWithoutCheck,
    /// Tagged crontab lines with no active session
    StrayChecks(usize),
    /// More than one tagged line
    DuplicateChecks(usize),
}

impl std::fmt::Display for Drift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Drift::ActiveWithoutCheck => write!(
                f,
                "active heating session has no scheduled check; run `tub heat check` to resume"
            ),
            Drift::StrayChecks(n) => write!(
                f,
                "{n} scheduled check(s) without an active session; they will be ignored when they fire"
            ),
            Drift::DuplicateChecks(n) => write!(
                f,
                "{n} scheduled checks found; the next check will collapse them to one"
            ),
        }
    }
}

/// Compare the persisted session with what the crontab says
pub fn reconcile(report: &StatusReport) -> Option<Drift> {
    let pending = report.pending_checks.len();
    match (report.session.active, pending) {
        (true, 0) => Some(Drift::ActiveWithoutCheck),
        (true, 1) | (false, 0) => None,
        (true, n) => Some(Drift::DuplicateChecks(n)),
        (false, n) => Some(Drift::StrayChecks(n)),
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
