// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One bounded queue per priority level behind a single "next event" operation
//!
//! Selection always serves the highest non-empty level, except that a head
//! event in a lower level that has waited longer than `max_wait_aging` is
//! served first. Among several aged heads the oldest wins. Within a level
//! order is FIFO.

use super::event_queue::{Dequeued, Enqueued, EventQueue, QueueError};
use crate::clock::Clock;
use crate::config::RouterConfig;
use crate::event::{Event, Priority};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Notify;

pub struct MultiQueue<C: Clock> {
    /// Highest priority first
    levels: Vec<EventQueue>,
    clock: C,
    max_wait: Duration,
    available: Arc<Notify>,
    /// Serializes select-then-dequeue so one event goes to one caller
    selection: Mutex<()>,
    closed: AtomicBool,
}

impl<C: Clock> MultiQueue<C> {
    pub fn new(config: &RouterConfig, clock: C) -> Self {
        let available = Arc::new(Notify::new());
        let levels = config
            .levels_highest_first()
            .into_iter()
            .map(|level| {
                EventQueue::with_notifier(
                    level,
                    config.queue_capacity_per_level,
                    config.backpressure_policy,
                    config.enqueue_timeout,
                    Arc::clone(&available),
                )
            })
            .collect();

        Self {
            levels,
            clock,
            max_wait: config.max_wait_aging,
            available,
            selection: Mutex::new(()),
            closed: AtomicBool::new(false),
        }
    }

    /// Configured levels, highest first
    pub fn levels(&self) -> Vec<Priority> {
        self.levels.iter().map(|q| q.level()).collect()
    }

    fn level(&self, priority: Priority) -> Result<&EventQueue, QueueError> {
        self.levels
            .iter()
            .find(|q| q.level() == priority)
            .ok_or(QueueError::NoSuchLevel(priority))
    }

    /// Route an event to its level's queue, applying backpressure
    pub async fn enqueue(&self, event: Arc<Event>) -> Result<Enqueued, QueueError> {
        self.level(event.priority())?.enqueue(event).await
    }

    pub fn try_enqueue(&self, event: Arc<Event>) -> Result<Enqueued, QueueError> {
        self.level(event.priority())?.try_enqueue(event)
    }

    /// Index of the level the next pop should serve
    fn select(&self) -> Option<usize> {
        let heads: Vec<Option<Instant>> =
            self.levels.iter().map(EventQueue::peek_created_at).collect();
        let highest = heads.iter().position(Option::is_some)?;

        if self.max_wait.is_zero() {
            return Some(highest);
        }

        let now = self.clock.now();
        let mut aged: Option<(usize, Instant)> = None;
        for (index, head) in heads.iter().enumerate().skip(highest + 1) {
            let Some(created_at) = *head else {
                continue;
            };
            if now.saturating_duration_since(created_at) <= self.max_wait {
                continue;
            }
            if aged.map_or(true, |(_, oldest)| created_at < oldest) {
                aged = Some((index, created_at));
            }
        }

        match aged {
            Some((index, _)) => {
                tracing::debug!(
                    level = %self.levels[index].level(),
                    "serving aged event ahead of higher priority"
                );
                Some(index)
            }
            None => Some(highest),
        }
    }

    /// Take the next event without waiting
    pub fn try_pop(&self) -> Option<Arc<Event>> {
        let _guard = self.selection.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            let index = self.select()?;
            if let Some(event) = self.levels[index].try_dequeue() {
                return Some(event);
            }
        }
    }

    /// Take the next event, waiting until one arrives or the queue is closed
    /// and empty
    pub async fn pop(&self) -> Dequeued {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(event) = self.try_pop() {
                return Dequeued::Event(event);
            }
            if self.is_closed() {
                return Dequeued::Closed;
            }

            notified.await;
        }
    }

    /// Total pending events across levels
    pub fn len(&self) -> usize {
        self.levels.iter().map(EventQueue::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(EventQueue::is_empty)
    }

    /// Pending events at one level; zero for an unconfigured level
    pub fn len_at(&self, priority: Priority) -> usize {
        self.level(priority).map(EventQueue::len).unwrap_or(0)
    }

    /// Events evicted by drop-oldest across levels
    pub fn dropped(&self) -> u64 {
        self.levels.iter().map(EventQueue::dropped).sum()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Close every level. Idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        for queue in &self.levels {
            queue.close();
        }
    }

    /// Discard pending events on every level, returning the total
    pub fn discard(&self) -> usize {
        let _guard = self.selection.lock().unwrap_or_else(|e| e.into_inner());
        self.levels.iter().map(EventQueue::discard).sum()
    }

    /// Close and discard in one step; no pop can slip in between
    pub fn close_and_discard(&self) -> usize {
        let _guard = self.selection.lock().unwrap_or_else(|e| e.into_inner());
        self.closed.store(true, Ordering::SeqCst);
        self.levels
            .iter()
            .map(|queue| {
                queue.close();
                queue.discard()
            })
            .sum()
    }
}

#[cfg(test)]
#[path = "multi_tests.rs"]
mod tests;
