// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: equipment, sensor, crontab

pub mod crontab;
pub mod equipment;
pub mod sensor;
pub mod status;
pub mod traced;

pub use crontab::{CrontabAdapter, CrontabError, SystemCrontab};
pub use equipment::{DryRunTrigger, EquipmentTrigger, IftttTrigger, TriggerError};
pub use sensor::{
    celsius_to_fahrenheit, ProbeReading, ReadingFileSource, SensorError, TemperatureReading,
    TemperatureSource,
};
pub use status::{EquipmentStatus, HeaterState, JsonEquipmentStatus, StatusError};
pub use traced::{TracedCrontab, TracedTrigger};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use crontab::{CrontabCall, FakeCrontab};
#[cfg(any(test, feature = "test-support"))]
pub use equipment::FakeTrigger;
#[cfg(any(test, feature = "test-support"))]
pub use sensor::FakeTemperatureSource;
#[cfg(any(test, feature = "test-support"))]
pub use status::{FakeEquipmentStatus, StatusCall};
