// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON file-based storage
//!
//! Layout under the state directory:
//! - `sessions/heat-target.json`
//! - `scheduled-jobs/<job_id>.json`

use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tub_core::session::SESSION_KEY;
use tub_core::{HeatingSession, JobDescriptor, JobId};

use crate::{JobStore, SessionStore, StorageError};

const SESSIONS: &str = "sessions";
const JOBS: &str = "scheduled-jobs";

/// JSON file-based storage
#[derive(Debug, Clone)]
pub struct JsonStore {
    base_path: PathBuf,
}

impl JsonStore {
    /// Open a store at the given path
    pub fn open(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, kind: &str, id: &str) -> PathBuf {
        self.base_path.join(kind).join(format!("{}.json", id))
    }

    fn save<T: Serialize>(
        &self,
        kind: &str,
        id: &str,
        data: &T,
        private: bool,
    ) -> Result<(), StorageError> {
        let path = self.path_for(kind, id);
        let json = serde_json::to_string_pretty(data)?;
        write_atomic(&path, json.as_bytes(), private)?;
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, kind: &str, id: &str) -> Result<Option<T>, StorageError> {
        let path = self.path_for(kind, id);
        match fs::read_to_string(&path) {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, kind: &str, id: &str) -> Result<bool, StorageError> {
        match fs::remove_file(self.path_for(kind, id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, kind: &str) -> Result<Vec<String>, StorageError> {
        let dir = self.base_path.join(kind);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(stem) = path.file_stem() {
                    ids.push(stem.to_string_lossy().to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

impl SessionStore for JsonStore {
    fn load_session(&self) -> Result<HeatingSession, StorageError> {
        Ok(self.load(SESSIONS, SESSION_KEY)?.unwrap_or_default())
    }

    fn save_session(&self, session: &HeatingSession) -> Result<(), StorageError> {
        self.save(SESSIONS, SESSION_KEY, session, false)
    }
}

impl JobStore for JsonStore {
    fn write_descriptor(&self, descriptor: &JobDescriptor) -> Result<(), StorageError> {
        // Descriptors carry the service token
        self.save(JOBS, descriptor.job_id.as_str(), descriptor, true)
    }

    fn read_descriptor(&self, job_id: &JobId) -> Result<Option<JobDescriptor>, StorageError> {
        self.load(JOBS, job_id.as_str())
    }

    fn delete_descriptor(&self, job_id: &JobId) -> Result<bool, StorageError> {
        self.delete(JOBS, job_id.as_str())
    }

    fn list_descriptors(&self) -> Result<Vec<JobId>, StorageError> {
        Ok(self
            .list(JOBS)?
            .iter()
            .filter_map(|id| JobId::parse(id))
            .collect())
    }
}

/// Write to a sibling temp file, then rename over the target
fn write_atomic(path: &Path, contents: &[u8], private: bool) -> io::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    fs::create_dir_all(dir)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = dir.join(format!(".{}.tmp", file_name));

    let mut file = open_for_write(&tmp, private)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    if let Err(e) = fs::rename(&tmp, path) {
        tracing::warn!(path = %path.display(), error = %e, "atomic rename failed");
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

#[cfg(unix)]
fn open_for_write(path: &Path, private: bool) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    if private {
        options.mode(0o600);
    }
    options.open(path)
}

#[cfg(not(unix))]
fn open_for_write(path: &Path, _private: bool) -> io::Result<fs::File> {
    fs::File::create(path)
}

#[cfg(test)]
#[path = "json_tests.rs"]
mod tests;
