// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake equipment status for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{EquipmentStatus, StatusError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Recorded status call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCall {
    IsHeaterOn,
    SetOn,
    SetOff,
}

#[derive(Default)]
struct FakeStatusState {
    heater_on: bool,
    calls: Vec<StatusCall>,
    fail: bool,
}

#[derive(Clone, Default)]
pub struct FakeEquipmentStatus {
    inner: Arc<Mutex<FakeStatusState>>,
}

impl FakeEquipmentStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_heater_on(self, on: bool) -> Self {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).heater_on = on;
        self
    }

    pub fn heater_on(&self) -> bool {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).heater_on
    }

    pub fn calls(&self) -> Vec<StatusCall> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    pub fn set_fail(&self, fail: bool) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).fail = fail;
    }

    fn record(&self, call: StatusCall) -> Result<std::sync::MutexGuard<'_, FakeStatusState>, StatusError> {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(call);
        if state.fail {
            return Err(StatusError::Unavailable("injected failure".into()));
        }
        Ok(state)
    }
}

#[async_trait]
impl EquipmentStatus for FakeEquipmentStatus {
    async fn is_heater_on(&self) -> Result<bool, StatusError> {
        Ok(self.record(StatusCall::IsHeaterOn)?.heater_on)
    }

    async fn set_heater_on(&self) -> Result<(), StatusError> {
        self.record(StatusCall::SetOn)?.heater_on = true;
        Ok(())
    }

    async fn set_heater_off(&self) -> Result<(), StatusError> {
        self.record(StatusCall::SetOff)?.heater_on = false;
        Ok(())
    }
}
