// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tub-storage: persistence for the heating session and job descriptors

mod json;
#[cfg(any(test, feature = "test-support"))]
mod memory;

pub use json::JsonStore;
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryStore;

use thiserror::Error;
use tub_core::{HeatingSession, JobDescriptor, JobId};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// The single heating session record.
///
/// A missing record loads as the idle session.
pub trait SessionStore: Clone + Send + Sync + 'static {
    fn load_session(&self) -> Result<HeatingSession, StorageError>;
    fn save_session(&self, session: &HeatingSession) -> Result<(), StorageError>;
}

/// Job descriptors read by the detached runner
pub trait JobStore: Clone + Send + Sync + 'static {
    fn write_descriptor(&self, descriptor: &JobDescriptor) -> Result<(), StorageError>;
    fn read_descriptor(&self, job_id: &JobId) -> Result<Option<JobDescriptor>, StorageError>;
    /// Returns whether a descriptor existed
    fn delete_descriptor(&self, job_id: &JobId) -> Result<bool, StorageError>;
    /// IDs of every stored descriptor carrying the job tag
    fn list_descriptors(&self) -> Result<Vec<JobId>, StorageError>;
}
