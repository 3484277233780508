// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! System crontab via `crontab -l` / `crontab -`

use super::{append_line, non_empty_lines, remove_lines, CrontabAdapter, CrontabError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Edits the invoking user's crontab, backing it up before each change
#[derive(Clone, Debug)]
pub struct SystemCrontab {
    program: String,
    backup_dir: Option<PathBuf>,
    keep_backups: usize,
}

impl Default for SystemCrontab {
    fn default() -> Self {
        Self {
            program: "crontab".to_string(),
            backup_dir: None,
            keep_backups: 20,
        }
    }
}

impl SystemCrontab {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the last `keep` tables under `dir` before every modification
    pub fn with_backups(mut self, dir: impl Into<PathBuf>, keep: usize) -> Self {
        self.backup_dir = Some(dir.into());
        self.keep_backups = keep;
        self
    }

    async fn read(&self) -> Result<String, CrontabError> {
        let output = Command::new(&self.program)
            .arg("-l")
            .output()
            .await
            .map_err(|e| CrontabError::CommandFailed(e.to_string()))?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        // No table yet is not an error
        if stderr.to_lowercase().contains("no crontab") {
            return Ok(String::new());
        }
        Err(CrontabError::CommandFailed(stderr.trim().to_string()))
    }

    async fn write(&self, table: &str) -> Result<(), CrontabError> {
        let mut child = Command::new(&self.program)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CrontabError::CommandFailed(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(table.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(CrontabError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }

    async fn backup(&self, table: &str) {
        let Some(dir) = &self.backup_dir else {
            return;
        };
        let name = format!(
            "crontab-{}.txt",
            chrono::Utc::now().format("%Y%m%d-%H%M%S%.3f")
        );
        let result: std::io::Result<usize> = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(dir.join(&name), table).await?;
            prune_backups(dir, self.keep_backups).await
        }
        .await;
        // A failed backup never blocks the edit
        if let Err(e) = result {
            tracing::warn!(dir = %dir.display(), error = %e, "crontab backup failed");
        }
    }
}

/// Delete all but the newest `keep` backups (names sort chronologically)
pub(crate) async fn prune_backups(dir: &Path, keep: usize) -> std::io::Result<usize> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with("crontab-") && name.ends_with(".txt") {
            names.push(name);
        }
    }
    names.sort();

    let excess = names.len().saturating_sub(keep);
    for name in &names[..excess] {
        tokio::fs::remove_file(dir.join(name)).await?;
    }
    Ok(excess)
}

#[async_trait]
impl CrontabAdapter for SystemCrontab {
    async fn add_entry(&self, line: &str) -> Result<(), CrontabError> {
        let table = self.read().await?;
        self.backup(&table).await;
        self.write(&append_line(&table, line)).await
    }

    async fn remove_by_pattern(&self, pattern: &str) -> Result<usize, CrontabError> {
        let table = self.read().await?;
        let (updated, removed) = remove_lines(&table, pattern);
        if removed == 0 {
            return Ok(0);
        }
        self.backup(&table).await;
        self.write(&updated).await?;
        Ok(removed)
    }

    async fn list_entries(&self) -> Result<Vec<String>, CrontabError> {
        Ok(non_empty_lines(&self.read().await?))
    }
}

#[cfg(test)]
#[path = "system_tests.rs"]
mod tests;
