// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User crontab adapters

mod system;

pub use system::SystemCrontab;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{CrontabCall, FakeCrontab};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from crontab operations
#[derive(Debug, Error)]
pub enum CrontabError {
    #[error("crontab command failed: {0}")]
    CommandFailed(String),
    #[error("crontab io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Adapter for the user's crontab
#[async_trait]
pub trait CrontabAdapter: Clone + Send + Sync + 'static {
    /// Append one line
    async fn add_entry(&self, line: &str) -> Result<(), CrontabError>;

    /// Remove every line containing `pattern`; returns how many were removed
    async fn remove_by_pattern(&self, pattern: &str) -> Result<usize, CrontabError>;

    /// Current non-empty lines
    async fn list_entries(&self) -> Result<Vec<String>, CrontabError>;
}

/// Table with `line` appended, always newline-terminated
pub(crate) fn append_line(table: &str, line: &str) -> String {
    let mut out = table.trim_end_matches('\n').to_string();
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(line.trim_end());
    out.push('\n');
    out
}

/// Table without lines containing `pattern`, plus the number removed
pub(crate) fn remove_lines(table: &str, pattern: &str) -> (String, usize) {
    let mut removed = 0;
    let mut out = String::new();
    for line in table.lines() {
        if line.contains(pattern) {
            removed += 1;
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }
    (out, removed)
}

pub(crate) fn non_empty_lines(table: &str) -> Vec<String> {
    table
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect()
}
