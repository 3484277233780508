// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heating session record and decision rule
//!
//! There is exactly one session slot system-wide. An idle session is not
//! deleted; it is reset to the idle representation so the next `start`
//! reuses the same slot. Every persisted change bumps `version`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Storage key of the single session record
pub const SESSION_KEY: &str = "heat-target";

/// Envelope no configured bound may leave
pub const HARD_MIN_F: f64 = 40.0;
pub const HARD_MAX_F: f64 = 110.0;

/// Why a session stopped being active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    TargetReached,
    Stopped,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::TargetReached => write!(f, "target reached"),
            EndReason::Stopped => write!(f, "stopped"),
        }
    }
}

/// The persisted heat-to-target session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatingSession {
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_temp_f: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<EndReason>,
    #[serde(default)]
    pub version: u64,
}

/// What a single evaluation should do, derived from persisted state only
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// No session owns the heater; stray invocations stop here
    NotActive,
    /// Reading at or above target
    TargetReached { current_f: f64, target_f: f64 },
    /// Below target, or no usable reading
    KeepHeating {
        current_f: Option<f64>,
        target_f: f64,
    },
}

impl HeatingSession {
    /// The idle representation
    pub fn idle() -> Self {
        Self::default()
    }

    /// Begin a new session in this slot
    pub fn begin(&self, target_f: f64, now: DateTime<Utc>) -> Self {
        Self {
            active: true,
            target_temp_f: Some(target_f),
            started_at: Some(now),
            ended_at: None,
            end_reason: None,
            version: self.version + 1,
        }
    }

    /// Reset the slot to idle, keeping when and why it ended
    pub fn end(&self, reason: EndReason, now: DateTime<Utc>) -> Self {
        Self {
            active: false,
            target_temp_f: None,
            started_at: self.started_at,
            ended_at: Some(now),
            end_reason: Some(reason),
            version: self.version + 1,
        }
    }

    /// Target, only while active
    pub fn active_target(&self) -> Option<f64> {
        if self.active {
            self.target_temp_f
        } else {
            None
        }
    }

    /// Decide the next step from the latest reading.
    ///
    /// A missing reading never ends a session: the heater keeps its current
    /// state and another check gets scheduled.
    pub fn decide(&self, reading_f: Option<f64>) -> Decision {
        let Some(target_f) = self.active_target() else {
            return Decision::NotActive;
        };
        match reading_f {
            Some(current_f) if current_f >= target_f => Decision::TargetReached {
                current_f,
                target_f,
            },
            current_f => Decision::KeepHeating {
                current_f,
                target_f,
            },
        }
    }
}

/// Allowed target range for `start`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetBounds {
    pub min_f: f64,
    pub max_f: f64,
}

impl Default for TargetBounds {
    fn default() -> Self {
        Self {
            min_f: 80.0,
            max_f: 110.0,
        }
    }
}

/// Rejected target temperature
#[derive(Debug, Clone, PartialEq, Error)]
#[error("target {target_f}°F is outside the allowed range {min_f}–{max_f}°F")]
pub struct InvalidTarget {
    pub target_f: f64,
    pub min_f: f64,
    pub max_f: f64,
}

impl TargetBounds {
    /// Accept a target inside the bounds (inclusive); NaN never passes
    pub fn check(&self, target_f: f64) -> Result<f64, InvalidTarget> {
        if target_f >= self.min_f && target_f <= self.max_f {
            Ok(target_f)
        } else {
            Err(InvalidTarget {
                target_f,
                min_f: self.min_f,
                max_f: self.max_f,
            })
        }
    }

    /// Whether these bounds sit inside the hard envelope
    pub fn is_within_envelope(&self) -> bool {
        self.min_f >= HARD_MIN_F && self.max_f <= HARD_MAX_F && self.min_f < self.max_f
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
