// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Equipment trigger adapters

mod dry_run;
mod ifttt;

pub use dry_run::DryRunTrigger;
pub use ifttt::IftttTrigger;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTrigger;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from equipment triggers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TriggerError {
    #[error("trigger {event} rejected with status {status}")]
    Rejected { event: String, status: u16 },
    #[error("trigger {event} failed: {message}")]
    Transport { event: String, message: String },
}

/// Fires a named equipment event (heater on, heater off)
#[async_trait]
pub trait EquipmentTrigger: Clone + Send + Sync + 'static {
    async fn trigger(&self, event: &str) -> Result<(), TriggerError>;
}
