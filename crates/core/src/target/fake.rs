// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake delivery targets for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{DeliveryError, DeliveryTarget};
use crate::event::Event;
use crate::id::EventId;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Records every delivered event
#[derive(Clone, Default)]
pub struct RecordingTarget {
    name: String,
    events: Arc<Mutex<Vec<Arc<Event>>>>,
    delay: Option<Duration>,
    received: Arc<Notify>,
}

impl RecordingTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sleep this long inside each delivery before recording
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get all recorded events, in delivery order
    pub fn events(&self) -> Vec<Arc<Event>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn ids(&self) -> Vec<EventId> {
        self.events().iter().map(|e| e.id().clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Wait until at least `n` events are recorded, or give up after `limit`
    pub async fn wait_for(&self, n: usize, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        loop {
            let notified = self.received.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.count() >= n {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.count() >= n;
            }
        }
    }
}

#[async_trait]
impl DeliveryTarget for RecordingTarget {
    async fn deliver(&self, event: Arc<Event>) -> Result<(), DeliveryError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
        self.received.notify_waiters();
        Ok(())
    }

    fn describe(&self) -> String {
        format!("recording:{}", self.name)
    }
}

/// Rejects every delivery
#[derive(Clone, Default)]
pub struct FailingTarget {
    attempts: Arc<AtomicUsize>,
}

impl FailingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeliveryTarget for FailingTarget {
    async fn deliver(&self, _event: Arc<Event>) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(DeliveryError::Rejected("always fails".to_string()))
    }

    fn describe(&self) -> String {
        "failing".to_string()
    }
}

/// Never completes a delivery
#[derive(Clone, Default)]
pub struct StallingTarget {
    attempts: Arc<AtomicUsize>,
}

impl StallingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeliveryTarget for StallingTarget {
    async fn deliver(&self, _event: Arc<Event>) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        std::future::pending::<()>().await;
        Ok(())
    }

    fn describe(&self) -> String {
        "stalling".to_string()
    }
}

/// Panics inside every delivery
#[derive(Clone, Default)]
pub struct PanickingTarget {
    attempts: Arc<AtomicUsize>,
}

impl PanickingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeliveryTarget for PanickingTarget {
    #[allow(clippy::panic)]
    async fn deliver(&self, event: Arc<Event>) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        panic!("target panicked on {}", event.id());
    }

    fn describe(&self) -> String {
        "panicking".to_string()
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
