// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded FIFO queue for a single priority level

use crate::config::BackpressurePolicy;
use crate::event::{Event, Priority};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Notify;

/// Queue errors surfaced to producers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("{level} queue is full ({capacity} events)")]
    Full { level: Priority, capacity: usize },

    #[error("no space in {level} queue after {waited:?}")]
    Timeout { level: Priority, waited: Duration },

    #[error("queue is closed")]
    Closed,

    #[error("no queue for priority {0}")]
    NoSuchLevel(Priority),
}

/// Successful enqueue outcome
#[derive(Debug, Clone, PartialEq)]
pub enum Enqueued {
    Accepted,
    /// Accepted after evicting the returned head (drop-oldest policy)
    DisplacedOldest(Arc<Event>),
}

/// Result of a blocking dequeue
#[derive(Debug, Clone, PartialEq)]
pub enum Dequeued {
    Event(Arc<Event>),
    /// The queue is closed and holds nothing more
    Closed,
}

#[derive(Default)]
struct QueueState {
    items: VecDeque<Arc<Event>>,
    closed: bool,
}

/// FIFO queue of events for one priority level
///
/// Length never exceeds `capacity`. The lock guards only the deque and is
/// never held across an await point.
pub struct EventQueue {
    level: Priority,
    capacity: usize,
    policy: BackpressurePolicy,
    enqueue_timeout: Duration,
    state: Mutex<QueueState>,
    /// Signalled when an item arrives or the queue closes; may be shared
    available: Arc<Notify>,
    /// Signalled when space frees or the queue closes
    space: Notify,
    dropped: AtomicU64,
}

impl EventQueue {
    pub fn new(
        level: Priority,
        capacity: usize,
        policy: BackpressurePolicy,
        enqueue_timeout: Duration,
    ) -> Self {
        Self::with_notifier(
            level,
            capacity,
            policy,
            enqueue_timeout,
            Arc::new(Notify::new()),
        )
    }

    /// Create a queue that signals arrivals on an externally owned notifier
    pub(crate) fn with_notifier(
        level: Priority,
        capacity: usize,
        policy: BackpressurePolicy,
        enqueue_timeout: Duration,
        available: Arc<Notify>,
    ) -> Self {
        Self {
            level,
            capacity: capacity.max(1),
            policy,
            enqueue_timeout,
            state: Mutex::new(QueueState::default()),
            available,
            space: Notify::new(),
            dropped: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn level(&self) -> Priority {
        self.level
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> BackpressurePolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Events evicted by the drop-oldest policy
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Creation instant of the head event
    pub fn peek_created_at(&self) -> Option<Instant> {
        self.lock().items.front().map(|e| e.created_at())
    }

    /// Append without waiting
    ///
    /// A full queue rejects under `reject` and `block`, and evicts the head
    /// under `drop_oldest`.
    pub fn try_enqueue(&self, event: Arc<Event>) -> Result<Enqueued, QueueError> {
        let mut state = self.lock();
        if state.closed {
            return Err(QueueError::Closed);
        }

        let outcome = if state.items.len() < self.capacity {
            state.items.push_back(event);
            Enqueued::Accepted
        } else if self.policy == BackpressurePolicy::DropOldest {
            let evicted = state.items.pop_front();
            state.items.push_back(event);
            self.dropped.fetch_add(1, Ordering::Relaxed);
            match evicted {
                Some(evicted) => {
                    tracing::debug!(level = %self.level, evicted = %evicted.id(), "dropped oldest");
                    Enqueued::DisplacedOldest(evicted)
                }
                None => Enqueued::Accepted,
            }
        } else {
            return Err(QueueError::Full {
                level: self.level,
                capacity: self.capacity,
            });
        };
        drop(state);

        self.available.notify_waiters();
        Ok(outcome)
    }

    /// Append, applying the configured backpressure policy
    pub async fn enqueue(&self, event: Arc<Event>) -> Result<Enqueued, QueueError> {
        if self.policy != BackpressurePolicy::Block {
            return self.try_enqueue(event);
        }

        let deadline = tokio::time::Instant::now() + self.enqueue_timeout;
        loop {
            let space = self.space.notified();
            tokio::pin!(space);
            space.as_mut().enable();

            match self.try_enqueue(Arc::clone(&event)) {
                Err(QueueError::Full { .. }) => {}
                other => return other,
            }

            if tokio::time::timeout_at(deadline, space).await.is_err() {
                return Err(QueueError::Timeout {
                    level: self.level,
                    waited: self.enqueue_timeout,
                });
            }
        }
    }

    /// Remove the head without waiting
    pub fn try_dequeue(&self) -> Option<Arc<Event>> {
        let event = self.lock().items.pop_front();
        if event.is_some() {
            self.space.notify_waiters();
        }
        event
    }

    /// Remove the head, waiting for one to arrive
    ///
    /// Events queued before `close` are still handed out; `Closed` is
    /// returned once the queue is closed and empty.
    pub async fn dequeue(&self) -> Dequeued {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(event) = self.try_dequeue() {
                return Dequeued::Event(event);
            }
            if self.is_closed() {
                return Dequeued::Closed;
            }

            notified.await;
        }
    }

    /// Refuse further enqueues and wake every blocked caller. Idempotent.
    pub fn close(&self) {
        let was_closed = std::mem::replace(&mut self.lock().closed, true);
        if !was_closed {
            tracing::debug!(level = %self.level, pending = self.len(), "queue closed");
        }
        self.available.notify_waiters();
        self.space.notify_waiters();
    }

    /// Remove every pending event, returning how many were removed
    pub fn discard(&self) -> usize {
        let discarded = {
            let mut state = self.lock();
            let n = state.items.len();
            state.items.clear();
            n
        };
        self.space.notify_waiters();
        discarded
    }
}

#[cfg(test)]
#[path = "event_queue_tests.rs"]
mod tests;
