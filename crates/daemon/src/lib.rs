// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tub-daemon: HTTP surface of the heat-to-target controller
//!
//! Every control-loop call goes through one async mutex, so concurrent
//! requests and cron callbacks are serialized inside the process.

pub mod auth;
pub mod control;
pub mod lifecycle;
pub mod routes;

pub use auth::TokenDigest;
pub use control::{DaemonTrigger, HeatControl};
pub use lifecycle::{
    build_controller, reconcile, startup, Daemon, DaemonController, Drift, LifecycleError,
};
pub use routes::{router, ApiError, AppState, Esp32Report};
