// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Router-wide counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the router counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RouterStats {
    /// Events accepted by `publish`
    pub published: u64,
    /// Publishes refused for validation, backpressure or shutdown
    pub rejected: u64,
    /// Events evicted by the drop-oldest policy
    pub dropped: u64,
    /// Events popped by a dispatcher
    pub dispatched: u64,
    pub delivered: u64,
    pub delivery_failures: u64,
    pub delivery_timeouts: u64,
    /// Deliveries skipped because the subscription was removed first
    pub skipped_inactive: u64,
    /// Events thrown away by a discarding shutdown
    pub discarded: u64,
    /// Subscriptions purged by the reaper
    pub reaped: u64,
}

#[derive(Default)]
pub(crate) struct Counters {
    published: AtomicU64,
    rejected: AtomicU64,
    dispatched: AtomicU64,
    delivered: AtomicU64,
    delivery_failures: AtomicU64,
    delivery_timeouts: AtomicU64,
    skipped_inactive: AtomicU64,
    discarded: AtomicU64,
    reaped: AtomicU64,
}

fn bump(cell: &AtomicU64, n: u64) {
    cell.fetch_add(n, Ordering::Relaxed);
}

impl Counters {
    pub(crate) fn published(&self) {
        bump(&self.published, 1);
    }

    pub(crate) fn rejected(&self) {
        bump(&self.rejected, 1);
    }

    pub(crate) fn dispatched(&self) {
        bump(&self.dispatched, 1);
    }

    pub(crate) fn delivered(&self) {
        bump(&self.delivered, 1);
    }

    pub(crate) fn delivery_failed(&self) {
        bump(&self.delivery_failures, 1);
    }

    pub(crate) fn delivery_timed_out(&self) {
        bump(&self.delivery_timeouts, 1);
    }

    pub(crate) fn skipped_inactive(&self) {
        bump(&self.skipped_inactive, 1);
    }

    pub(crate) fn discarded(&self, n: usize) {
        bump(&self.discarded, n as u64);
    }

    pub(crate) fn reaped(&self, n: usize) {
        bump(&self.reaped, n as u64);
    }

    pub(crate) fn dispatched_so_far(&self) -> u64 {
        self.dispatched.load(Ordering::SeqCst)
    }

    /// `dropped` lives in the queues and is passed in
    pub(crate) fn snapshot(&self, dropped: u64) -> RouterStats {
        let load = |cell: &AtomicU64| cell.load(Ordering::Relaxed);
        RouterStats {
            published: load(&self.published),
            rejected: load(&self.rejected),
            dropped,
            dispatched: load(&self.dispatched),
            delivered: load(&self.delivered),
            delivery_failures: load(&self.delivery_failures),
            delivery_timeouts: load(&self.delivery_timeouts),
            skipped_inactive: load(&self.skipped_inactive),
            discarded: load(&self.discarded),
            reaped: load(&self.reaped),
        }
    }
}
