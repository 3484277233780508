// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Heat-to-target engine: the control loop and its self-rescheduling job chain

mod chain;
mod controller;
mod error;

pub use chain::{ChainConfig, JobChain, ScheduledCheck};
pub use controller::{ControllerConfig, ControllerDeps, HeatTargetController};
pub use error::{ChainError, ControlError};
