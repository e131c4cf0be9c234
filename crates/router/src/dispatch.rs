// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch workers
//!
//! A worker takes the dispatch gate, pops one event, matches it and takes a
//! lane ticket on every matched subscription, then releases the gate. Pop,
//! match and ticketing therefore happen in one global order even with many
//! workers. Each matched delivery is handed to its own task and the worker
//! goes straight back to the queue.
//!
//! A delivery's deadline is fixed at dispatch, so time spent waiting for
//! the lane counts against `delivery_timeout`. A delivery whose deadline
//! passes before its turn is recorded as timed out without calling the
//! target. Every delivery therefore settles within `delivery_timeout` of
//! dispatch, however slow the subscriber.

use crate::router::Shared;
use evr_core::{Clock, DeliveryLane, Dequeued, Event, IdGen, Subscription};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::Instant;

struct Batch {
    event: Arc<Event>,
    deadline: Instant,
    tickets: Vec<(Arc<Subscription>, u64)>,
}

/// Deliveries handed off by workers and not yet settled
#[derive(Default)]
pub(crate) struct InFlight {
    count: AtomicUsize,
    settled: Notify,
}

impl InFlight {
    pub(crate) fn len(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Wait until no delivery is in flight
    pub(crate) async fn settled(&self) {
        loop {
            let notified = self.settled.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.len() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Counts one delivery as in flight until dropped
struct Settle<C: Clock, I: IdGen>(Arc<Shared<C, I>>);

impl<C: Clock, I: IdGen> Settle<C, I> {
    fn new(shared: &Arc<Shared<C, I>>) -> Self {
        shared.in_flight.count.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(shared))
    }
}

impl<C: Clock, I: IdGen> Drop for Settle<C, I> {
    fn drop(&mut self) {
        if self.0.in_flight.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.in_flight.settled.notify_waiters();
        }
    }
}

/// Run until the queue is closed and empty
///
/// Returns once every event is handed off. Deliveries may still be running;
/// see `InFlight::settled`.
pub(crate) async fn run_worker<C: Clock, I: IdGen>(shared: Arc<Shared<C, I>>, worker: usize) {
    tracing::debug!(worker, "dispatch worker started");
    while let Some(batch) = next_batch(&shared).await {
        hand_off(&shared, batch);
    }
    tracing::debug!(worker, "dispatch worker stopped");
}

async fn next_batch<C: Clock, I: IdGen>(shared: &Shared<C, I>) -> Option<Batch> {
    let _gate = shared.gate.lock().await;

    let event = match shared.queue.pop().await {
        Dequeued::Event(event) => event,
        Dequeued::Closed => return None,
    };
    shared.counters.dispatched();
    let deadline = Instant::now() + shared.config.delivery_timeout;

    let tickets: Vec<_> = shared
        .registry
        .matching(&event)
        .into_iter()
        .map(|subscription| {
            let ticket = subscription.lane().take_ticket();
            (subscription, ticket)
        })
        .collect();

    tracing::debug!(
        event_id = %event.id(),
        priority = %event.priority(),
        matched = tickets.len(),
        "dispatching"
    );
    Some(Batch {
        event,
        deadline,
        tickets,
    })
}

/// Spawn one delivery task per matched subscription
fn hand_off<C: Clock, I: IdGen>(shared: &Arc<Shared<C, I>>, batch: Batch) {
    for (subscription, ticket) in batch.tickets {
        let settle = Settle::new(shared);
        let event = Arc::clone(&batch.event);
        let deadline = batch.deadline;
        tokio::spawn(async move {
            let shared = &settle.0;
            deliver_one(shared, &subscription, event, ticket, deadline).await;
        });
    }
}

/// Held while a delivery owns its lane; dropping it lets the next ticket go
struct Turn<'a> {
    lane: &'a DeliveryLane,
    ticket: u64,
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        self.lane.finish_turn(self.ticket);
    }
}

async fn deliver_one<C: Clock, I: IdGen>(
    shared: &Shared<C, I>,
    subscription: &Subscription,
    event: Arc<Event>,
    ticket: u64,
    deadline: Instant,
) {
    subscription.lane().wait_turn(ticket).await;
    let _turn = Turn {
        lane: subscription.lane(),
        ticket,
    };

    let event_id = event.id().clone();
    if !subscription.is_active() {
        subscription.record_skipped();
        shared.counters.skipped_inactive();
        tracing::debug!(
            subscription = %subscription.id(),
            %event_id,
            "subscription removed, skipping delivery"
        );
        return;
    }

    let timeout = shared.config.delivery_timeout;
    if Instant::now() >= deadline {
        tracing::warn!(
            subscription = %subscription.id(),
            %event_id,
            timeout_ms = timeout.as_millis() as u64,
            "delivery expired waiting for earlier deliveries"
        );
        subscription.record_timeout();
        shared.counters.delivery_timed_out();
        return;
    }

    // The target runs in its own task so a panic stays inside it and a
    // timed-out attempt can be aborted.
    let target = Arc::clone(subscription.target());
    let mut attempt = tokio::spawn(async move { target.deliver(event).await });

    match tokio::time::timeout_at(deadline, &mut attempt).await {
        Ok(Ok(Ok(()))) => {
            subscription.record_delivered();
            shared.counters.delivered();
        }
        Ok(Ok(Err(e))) => {
            tracing::warn!(
                subscription = %subscription.id(),
                %event_id,
                error = %e,
                "delivery failed"
            );
            subscription.record_failure(e.to_string());
            shared.counters.delivery_failed();
        }
        Ok(Err(e)) => {
            let reason = if e.is_panic() {
                "target panicked".to_string()
            } else {
                e.to_string()
            };
            tracing::warn!(
                subscription = %subscription.id(),
                %event_id,
                error = %reason,
                "delivery aborted"
            );
            subscription.record_failure(reason);
            shared.counters.delivery_failed();
        }
        Err(_) => {
            attempt.abort();
            tracing::warn!(
                subscription = %subscription.id(),
                %event_id,
                timeout_ms = timeout.as_millis() as u64,
                "delivery timed out"
            );
            subscription.record_timeout();
            shared.counters.delivery_timed_out();
        }
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
