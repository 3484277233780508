// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake crontab for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{CrontabAdapter, CrontabError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Recorded crontab call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrontabCall {
    Add { line: String },
    RemoveByPattern { pattern: String },
    List,
}

#[derive(Default)]
struct FakeCrontabState {
    lines: Vec<String>,
    calls: Vec<CrontabCall>,
    fail_add: bool,
    fail_remove: bool,
}

/// In-memory crontab with call recording and failure injection
#[derive(Clone, Default)]
pub struct FakeCrontab {
    inner: Arc<Mutex<FakeCrontabState>>,
}

impl FakeCrontab {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a line without recording a call
    pub fn with_line(self, line: &str) -> Self {
        self.state().lines.push(line.to_string());
        self
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeCrontabState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn lines(&self) -> Vec<String> {
        self.state().lines.clone()
    }

    /// Lines containing `pattern`
    pub fn matching(&self, pattern: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.contains(pattern))
            .collect()
    }

    pub fn calls(&self) -> Vec<CrontabCall> {
        self.state().calls.clone()
    }

    pub fn removals(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, CrontabCall::RemoveByPattern { .. }))
            .count()
    }

    pub fn adds(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, CrontabCall::Add { .. }))
            .count()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn set_fail_add(&self, fail: bool) {
        self.state().fail_add = fail;
    }

    pub fn set_fail_remove(&self, fail: bool) {
        self.state().fail_remove = fail;
    }
}

#[async_trait]
impl CrontabAdapter for FakeCrontab {
    async fn add_entry(&self, line: &str) -> Result<(), CrontabError> {
        let mut state = self.state();
        state.calls.push(CrontabCall::Add {
            line: line.to_string(),
        });
        if state.fail_add {
            return Err(CrontabError::CommandFailed("injected add failure".into()));
        }
        state.lines.push(line.to_string());
        Ok(())
    }

    async fn remove_by_pattern(&self, pattern: &str) -> Result<usize, CrontabError> {
        let mut state = self.state();
        state.calls.push(CrontabCall::RemoveByPattern {
            pattern: pattern.to_string(),
        });
        if state.fail_remove {
            return Err(CrontabError::CommandFailed("injected remove failure".into()));
        }
        let before = state.lines.len();
        state.lines.retain(|l| !l.contains(pattern));
        Ok(before - state.lines.len())
    }

    async fn list_entries(&self) -> Result<Vec<String>, CrontabError> {
        let mut state = self.state();
        state.calls.push(CrontabCall::List);
        Ok(state.lines.clone())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
