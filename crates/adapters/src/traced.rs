// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::crontab::{CrontabAdapter, CrontabError};
use crate::equipment::{EquipmentTrigger, TriggerError};
use async_trait::async_trait;
use tracing::Instrument;

/// Wrapper that adds tracing to any EquipmentTrigger
#[derive(Clone)]
pub struct TracedTrigger<T> {
    inner: T,
}

impl<T> TracedTrigger<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: EquipmentTrigger> EquipmentTrigger for TracedTrigger<T> {
    async fn trigger(&self, event: &str) -> Result<(), TriggerError> {
        let span = tracing::info_span!("equipment.trigger", event);
        async move {
            // Precondition: event names go into a URL path
            if event.is_empty() || event.contains('/') {
                tracing::error!("invalid event name");
                return Err(TriggerError::Transport {
                    event: event.to_string(),
                    message: "invalid event name".to_string(),
                });
            }

            let start = std::time::Instant::now();
            let result = self.inner.trigger(event).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "event sent"),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "trigger failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any CrontabAdapter
#[derive(Clone)]
pub struct TracedCrontab<C> {
    inner: C,
}

impl<C> TracedCrontab<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: CrontabAdapter> CrontabAdapter for TracedCrontab<C> {
    async fn add_entry(&self, line: &str) -> Result<(), CrontabError> {
        let span = tracing::info_span!("crontab.add");
        async move {
            // Precondition: exactly one line
            if line.contains('\n') {
                tracing::error!("entry spans multiple lines");
                return Err(CrontabError::CommandFailed(
                    "crontab entry must be a single line".to_string(),
                ));
            }

            let start = std::time::Instant::now();
            let result = self.inner.add_entry(line).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(()) => {
                    tracing::info!(line, elapsed_ms = elapsed.as_millis() as u64, "entry added")
                }
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "add failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn remove_by_pattern(&self, pattern: &str) -> Result<usize, CrontabError> {
        let span = tracing::info_span!("crontab.remove", pattern);
        async move {
            // An empty pattern would match every line
            if pattern.is_empty() {
                tracing::error!("refusing empty removal pattern");
                return Err(CrontabError::CommandFailed(
                    "removal pattern must not be empty".to_string(),
                ));
            }

            let result = self.inner.remove_by_pattern(pattern).await;
            match &result {
                Ok(removed) => tracing::info!(removed, "entries removed"),
                Err(e) => tracing::warn!(error = %e, "remove failed"),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn list_entries(&self) -> Result<Vec<String>, CrontabError> {
        let result = self.inner.list_entries().await;
        tracing::trace!(
            count = result.as_ref().map(|v| v.len()).ok(),
            "listed entries"
        );
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
