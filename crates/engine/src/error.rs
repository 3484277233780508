// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use thiserror::Error;
use tub_adapters::CrontabError;
use tub_core::InvalidTarget;
use tub_storage::StorageError;

/// Errors from scheduling or cancelling checks
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("no service credential configured; refusing to schedule an unauthenticated check")]
    MissingCredential,
    #[error("crontab error: {0}")]
    Crontab(#[from] CrontabError),
    #[error("job store error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors `start` reports before anything was commanded
#[derive(Debug, Error)]
pub enum ControlError {
    #[error(transparent)]
    InvalidTarget(#[from] InvalidTarget),
    #[error("session store error: {0}")]
    Storage(#[from] StorageError),
}
