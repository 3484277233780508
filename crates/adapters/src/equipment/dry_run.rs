// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dry-run trigger for when equipment control is disabled.

use super::{EquipmentTrigger, TriggerError};
use async_trait::async_trait;

/// Trigger that only logs.
///
/// Used on benches and in deployments without webhook credentials.
#[derive(Clone, Copy, Debug, Default)]
pub struct DryRunTrigger;

impl DryRunTrigger {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EquipmentTrigger for DryRunTrigger {
    async fn trigger(&self, event: &str) -> Result<(), TriggerError> {
        tracing::info!(event, "dry run: equipment event not sent");
        Ok(())
    }
}
