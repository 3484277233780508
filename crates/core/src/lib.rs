// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tub-core: domain types for the heat-to-target controller
//!
//! This crate provides:
//! - The persisted heating session record and its pure decision rule
//! - Scheduled-check identity, job descriptors and one-shot cron lines
//! - Structured results returned by every control-loop operation
//! - Clock and ID abstractions for deterministic tests
//! - Service configuration

pub mod clock;
pub mod config;
pub mod id;
pub mod job;
pub mod outcome;
pub mod session;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{
    clamp_report_interval, locate_program, ConfigError, EquipmentConfig, HeatConfig, RunnerConfig, SensorConfig,
    TubConfig,
};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use job::{CronEntry, JobDescriptor, JobId, RunnerCommand, JOB_TAG};
pub use outcome::{CheckResult, StartResult, StatusReport, StopResult};
pub use session::{Decision, EndReason, HeatingSession, InvalidTarget, TargetBounds};
