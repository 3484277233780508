// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heater on/off bookkeeping

mod json;

pub use json::JsonEquipmentStatus;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeEquipmentStatus, StatusCall};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from equipment status storage
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt equipment status: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("equipment status unavailable: {0}")]
    Unavailable(String),
}

/// Persisted heater state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaterState {
    pub heater_on: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_at: Option<DateTime<Utc>>,
}

/// Last commanded heater state.
///
/// This records what was successfully commanded, not what the equipment
/// reports.
#[async_trait]
pub trait EquipmentStatus: Clone + Send + Sync + 'static {
    async fn is_heater_on(&self) -> Result<bool, StatusError>;
    async fn set_heater_on(&self) -> Result<(), StatusError>;
    async fn set_heater_off(&self) -> Result<(), StatusError>;
}
