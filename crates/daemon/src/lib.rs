// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Event router daemon (evrd)
//!
//! Loads configuration, registers journal subscriptions and publishes events
//! read from standard input.

pub mod config;
pub mod ingest;
pub mod lifecycle;

pub use config::{DaemonConfig, SubscriptionConfig};
pub use ingest::{ingest, IngestSummary};
pub use lifecycle::{startup, Daemon, DaemonError, ExitReport};
