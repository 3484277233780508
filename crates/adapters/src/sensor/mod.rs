// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Water temperature source

mod file;

pub use file::ReadingFileSource;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTemperatureSource;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the temperature source
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt reading: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("sensor unavailable: {0}")]
    Unavailable(String),
}

/// One probe on a multi-sensor bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReading {
    pub address: String,
    pub temp_c: f64,
}

/// Latest reading reported by the ESP32
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    pub device_id: String,
    pub temp_f: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sensors: Vec<ProbeReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<u64>,
    pub received_at: DateTime<Utc>,
}

pub fn celsius_to_fahrenheit(temp_c: f64) -> f64 {
    temp_c * 9.0 / 5.0 + 32.0
}

/// Source of the current water temperature.
///
/// `Ok(None)` means no usable reading: none yet, or too old to trust.
#[async_trait]
pub trait TemperatureSource: Clone + Send + Sync + 'static {
    async fn latest_temperature_f(&self) -> Result<Option<f64>, SensorError>;
}
