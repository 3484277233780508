// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Equipment status kept in `equipment-status.json`

use super::{EquipmentStatus, HeaterState, StatusError};
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use tub_core::Clock;

#[derive(Clone)]
pub struct JsonEquipmentStatus<C: Clock> {
    path: PathBuf,
    clock: C,
}

impl<C: Clock> JsonEquipmentStatus<C> {
    pub fn new(path: impl Into<PathBuf>, clock: C) -> Self {
        Self {
            path: path.into(),
            clock,
        }
    }

    /// Stored state; a missing file means off
    pub async fn load(&self) -> Result<HeaterState, StatusError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HeaterState::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, heater_on: bool) -> Result<(), StatusError> {
        let state = HeaterState {
            heater_on,
            changed_at: Some(self.clock.now()),
        };
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&state)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!(heater_on, "equipment status updated");
        Ok(())
    }
}

#[async_trait]
impl<C: Clock + 'static> EquipmentStatus for JsonEquipmentStatus<C> {
    async fn is_heater_on(&self) -> Result<bool, StatusError> {
        Ok(self.load().await?.heater_on)
    }

    async fn set_heater_on(&self) -> Result<(), StatusError> {
        self.store(true).await
    }

    async fn set_heater_off(&self) -> Result<(), StatusError> {
        self.store(false).await
    }
}

#[cfg(test)]
#[path = "json_tests.rs"]
mod tests;
