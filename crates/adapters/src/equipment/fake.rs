// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake equipment trigger for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{EquipmentTrigger, TriggerError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeTriggerState {
    calls: Vec<String>,
    failing: HashSet<String>,
}

/// Fake trigger recording every event, with per-event failure injection
#[derive(Clone, Default)]
pub struct FakeTrigger {
    inner: Arc<Mutex<FakeTriggerState>>,
}

impl FakeTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event fired, in order, including failed attempts
    pub fn calls(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.calls().iter().filter(|e| *e == event).count()
    }

    /// Make `event` fail until cleared
    pub fn fail_event(&self, event: &str, fail: bool) {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if fail {
            state.failing.insert(event.to_string());
        } else {
            state.failing.remove(event);
        }
    }
}

#[async_trait]
impl EquipmentTrigger for FakeTrigger {
    async fn trigger(&self, event: &str) -> Result<(), TriggerError> {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(event.to_string());
        if state.failing.contains(event) {
            return Err(TriggerError::Rejected {
                event: event.to_string(),
                status: 503,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
