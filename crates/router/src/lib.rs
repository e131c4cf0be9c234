// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Event router: publish, subscribe and concurrent dispatch

mod dispatch;
mod error;
mod router;
mod stats;

pub use error::{NotFound, PublishError, StartError, SubscribeError};
pub use router::{Ack, EventRouter, ShutdownMode, ShutdownReport};
pub use stats::RouterStats;
