// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Readings stored in `esp32-temperature.json` by the ingestion endpoint

use super::{SensorError, TemperatureReading, TemperatureSource};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tub_core::Clock;

#[derive(Clone)]
pub struct ReadingFileSource<C: Clock> {
    path: PathBuf,
    max_age: Duration,
    clock: C,
}

impl<C: Clock> ReadingFileSource<C> {
    pub fn new(path: impl Into<PathBuf>, max_age: Duration, clock: C) -> Self {
        Self {
            path: path.into(),
            max_age,
            clock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Latest stored reading regardless of age
    pub async fn latest_reading(&self) -> Result<Option<TemperatureReading>, SensorError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the stored reading
    pub async fn store(&self, reading: &TemperatureReading) -> Result<(), SensorError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(reading)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn is_fresh(&self, reading: &TemperatureReading) -> bool {
        let age = self.clock.now().signed_duration_since(reading.received_at);
        // Readings from the future (clock skew) count as fresh
        age.to_std().map(|age| age <= self.max_age).unwrap_or(true)
    }
}

#[async_trait]
impl<C: Clock + 'static> TemperatureSource for ReadingFileSource<C> {
    async fn latest_temperature_f(&self) -> Result<Option<f64>, SensorError> {
        let Some(reading) = self.latest_reading().await? else {
            tracing::debug!("no temperature reading yet");
            return Ok(None);
        };
        if !reading.temp_f.is_finite() {
            tracing::warn!(device = %reading.device_id, "ignoring non-finite reading");
            return Ok(None);
        }
        if !self.is_fresh(&reading) {
            tracing::warn!(
                device = %reading.device_id,
                received_at = %reading.received_at,
                "temperature reading is stale"
            );
            return Ok(None);
        }
        Ok(Some(reading.temp_f))
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
