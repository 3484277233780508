// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory store for testing

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tub_core::{HeatingSession, JobDescriptor, JobId};

use crate::{JobStore, SessionStore, StorageError};

#[derive(Default)]
struct MemoryState {
    session: Option<HeatingSession>,
    descriptors: BTreeMap<JobId, JobDescriptor>,
    session_saves: usize,
    fail_loads: bool,
    fail_saves: bool,
    fail_descriptor_writes: bool,
}

/// In-memory session and job store with failure injection
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed the session record without counting a save
    pub fn with_session(self, session: HeatingSession) -> Self {
        self.state().session = Some(session);
        self
    }

    pub fn session(&self) -> HeatingSession {
        self.state().session.clone().unwrap_or_default()
    }

    pub fn session_saves(&self) -> usize {
        self.state().session_saves
    }

    pub fn descriptors(&self) -> Vec<JobDescriptor> {
        self.state().descriptors.values().cloned().collect()
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.state().fail_loads = fail;
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.state().fail_saves = fail;
    }

    pub fn set_fail_descriptor_writes(&self, fail: bool) {
        self.state().fail_descriptor_writes = fail;
    }
}

impl SessionStore for MemoryStore {
    fn load_session(&self) -> Result<HeatingSession, StorageError> {
        let state = self.state();
        if state.fail_loads {
            return Err(StorageError::Unavailable("injected load failure".into()));
        }
        Ok(state.session.clone().unwrap_or_default())
    }

    fn save_session(&self, session: &HeatingSession) -> Result<(), StorageError> {
        let mut state = self.state();
        if state.fail_saves {
            return Err(StorageError::Unavailable("injected save failure".into()));
        }
        state.session = Some(session.clone());
        state.session_saves += 1;
        Ok(())
    }
}

impl JobStore for MemoryStore {
    fn write_descriptor(&self, descriptor: &JobDescriptor) -> Result<(), StorageError> {
        let mut state = self.state();
        if state.fail_descriptor_writes {
            return Err(StorageError::Unavailable("injected write failure".into()));
        }
        state
            .descriptors
            .insert(descriptor.job_id.clone(), descriptor.clone());
        Ok(())
    }

    fn read_descriptor(&self, job_id: &JobId) -> Result<Option<JobDescriptor>, StorageError> {
        Ok(self.state().descriptors.get(job_id).cloned())
    }

    fn delete_descriptor(&self, job_id: &JobId) -> Result<bool, StorageError> {
        Ok(self.state().descriptors.remove(job_id).is_some())
    }

    fn list_descriptors(&self) -> Result<Vec<JobId>, StorageError> {
        Ok(self.state().descriptors.keys().cloned().collect())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
