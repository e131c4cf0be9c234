// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded event queues
//!
//! This module provides:
//! - `EventQueue` - FIFO queue for one priority level with a backpressure policy
//! - `MultiQueue` - one `EventQueue` per level with priority-with-aging selection

mod event_queue;
mod multi;

pub use event_queue::{Dequeued, Enqueued, EventQueue, QueueError};
pub use multi::MultiQueue;
