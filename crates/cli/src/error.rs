// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.
//!
//! Each error carries what went wrong, why it might have happened, and how
//! to fix it.

use std::fmt;

use crate::client::ClientError;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct TubError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    /// Original error if any
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TubError {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    /// Add context about why this error might have happened.
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    /// Add a suggestion for how to fix this error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Set the source error that caused this error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for TubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for TubError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Common error builders for typical failure scenarios.
impl TubError {
    /// The daemon did not answer at all.
    pub fn daemon_unreachable(base_url: &str, cause: ClientError) -> Self {
        TubError::new(format!("Could not reach tubd at {}", base_url))
            .with_context("The daemon may not be running")
            .with_context("base_url may point at the wrong host or port")
            .with_suggestion("Start the daemon: tubd")
            .with_suggestion("Check the configured base_url: tub config")
            .with_source(cause)
    }

    /// The daemon rejected our credential.
    pub fn unauthorized() -> Self {
        TubError::new("tubd rejected the API token")
            .with_context("The CLI and the daemon must share the same api_token")
            .with_suggestion("Set api_token in the config file or export TUB_API_TOKEN")
    }

    /// No credential to send.
    pub fn missing_token() -> Self {
        TubError::new("No API token configured")
            .with_context("Every heat-to-target call is authenticated")
            .with_suggestion("Set api_token in the config file or export TUB_API_TOKEN")
    }

    /// Target outside the configured bounds.
    pub fn invalid_target(detail: &str) -> Self {
        TubError::new("Target temperature rejected")
            .with_context(detail.to_string())
            .with_suggestion("Show the configured bounds: tub config")
    }

    /// A scheduled job whose descriptor is gone.
    pub fn job_not_found(job_id: &str) -> Self {
        TubError::new(format!("Job '{}' not found", job_id))
            .with_context("The check may already have run or been cancelled")
            .with_suggestion("List scheduled checks: tub cron list")
    }

    /// Map a client failure to the most helpful display.
    pub fn from_client(base_url: &str, error: ClientError) -> Self {
        match error {
            ClientError::MissingToken => TubError::missing_token(),
            ClientError::Rejected { status: 401, .. } => TubError::unauthorized(),
            ClientError::Rejected { status: 422, body } => {
                TubError::invalid_target(&ClientError::error_message(&body))
            }
            e @ ClientError::Unreachable { .. } => TubError::daemon_unreachable(base_url, e),
            e => TubError::new(e.to_string()).with_source(e),
        }
    }
}
