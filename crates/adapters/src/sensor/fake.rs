// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake temperature source for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{SensorError, TemperatureSource};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeSensorState {
    temp_f: Option<f64>,
    reads: usize,
    fail: bool,
}

/// Fake source returning whatever the test last set
#[derive(Clone, Default)]
pub struct FakeTemperatureSource {
    inner: Arc<Mutex<FakeSensorState>>,
}

impl FakeTemperatureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reading(temp_f: f64) -> Self {
        let source = Self::new();
        source.set(Some(temp_f));
        source
    }

    pub fn set(&self, temp_f: Option<f64>) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).temp_f = temp_f;
    }

    pub fn set_fail(&self, fail: bool) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).fail = fail;
    }

    pub fn reads(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).reads
    }
}

#[async_trait]
impl TemperatureSource for FakeTemperatureSource {
    async fn latest_temperature_f(&self) -> Result<Option<f64>, SensorError> {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.reads += 1;
        if state.fail {
            return Err(SensorError::Unavailable("injected failure".into()));
        }
        Ok(state.temp_f)
    }
}
