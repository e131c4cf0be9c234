// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The event router: producer entry point, subscription management and
//! worker lifecycle
//!
//! All state lives in one `Shared` owned by the router and handed to
//! workers at `start`. Independent routers never share anything.

use crate::dispatch::{self, InFlight};
use crate::error::{NotFound, PublishError, StartError, SubscribeError};
use crate::stats::{Counters, RouterStats};
use evr_core::{
    Clock, ConfigError, DeliveryStats, DeliveryTarget, Enqueued, EventFactory, EventId, FilterSpec,
    IdGen, MultiQueue, NewEvent, Priority, RouterConfig, Subscription, SubscriptionFilter,
    SubscriptionId, SubscriptionInfo, SubscriptionRegistry, SystemClock, UuidIdGen,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Receipt for an accepted event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub event_id: EventId,
    pub priority: Priority,
    /// Event evicted to make room (drop-oldest policy)
    pub displaced: Option<EventId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Stop accepting events and deliver everything already queued
    Drain,
    /// Stop immediately and throw queued events away
    Discard,
}

/// Outcome of `shutdown`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Events dispatched after shutdown began
    pub drained: u64,
    /// Events discarded unseen
    pub discarded: usize,
}

pub(crate) struct Shared<C: Clock, I: IdGen> {
    pub(crate) config: RouterConfig,
    clock: C,
    id_gen: I,
    factory: EventFactory<C, I>,
    pub(crate) queue: MultiQueue<C>,
    pub(crate) registry: SubscriptionRegistry,
    pub(crate) counters: Counters,
    /// Serializes pop, match and lane ticketing across workers
    pub(crate) gate: tokio::sync::Mutex<()>,
    pub(crate) in_flight: InFlight,
    accepting: AtomicBool,
}

impl<C: Clock, I: IdGen> Shared<C, I> {
    fn reap(&self) -> usize {
        let reaped = self.registry.reap();
        if reaped > 0 {
            self.counters.reaped(reaped);
            tracing::info!(reaped, "purged removed subscriptions");
        }
        reaped
    }
}

struct Workers {
    dispatchers: Vec<JoinHandle<()>>,
    reaper: JoinHandle<()>,
}

enum Lifecycle {
    Idle,
    Running(Workers),
    Stopped,
}

/// Routes published events to matching subscriptions
pub struct EventRouter<C: Clock = SystemClock, I: IdGen = UuidIdGen> {
    shared: Arc<Shared<C, I>>,
    lifecycle: Mutex<Lifecycle>,
}

impl EventRouter {
    /// Router on the system clock with UUID ids
    pub fn new(config: RouterConfig) -> Result<Self, ConfigError> {
        Self::with_deps(config, SystemClock, UuidIdGen)
    }
}

impl<C: Clock, I: IdGen> EventRouter<C, I> {
    pub fn with_deps(config: RouterConfig, clock: C, id_gen: I) -> Result<Self, ConfigError> {
        config.validate()?;

        let shared = Shared {
            factory: EventFactory::from_config(&config, clock.clone(), id_gen.clone()),
            queue: MultiQueue::new(&config, clock.clone()),
            registry: SubscriptionRegistry::new(),
            counters: Counters::default(),
            gate: tokio::sync::Mutex::new(()),
            in_flight: InFlight::default(),
            accepting: AtomicBool::new(true),
            config,
            clock,
            id_gen,
        };

        Ok(Self {
            shared: Arc::new(shared),
            lifecycle: Mutex::new(Lifecycle::Idle),
        })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.shared.config
    }

    fn is_accepting(&self) -> bool {
        self.shared.accepting.load(Ordering::SeqCst)
    }

    /// Validate an event and queue it for dispatch
    ///
    /// Under the `block` policy this waits for space up to the configured
    /// enqueue timeout.
    pub async fn publish(&self, draft: NewEvent) -> Result<Ack, PublishError> {
        if !self.is_accepting() {
            self.shared.counters.rejected();
            return Err(PublishError::RouterClosed);
        }

        let event = match self.shared.factory.create(draft) {
            Ok(event) => Arc::new(event),
            Err(e) => {
                self.shared.counters.rejected();
                tracing::warn!(error = %e, "rejected invalid event");
                return Err(e.into());
            }
        };
        let event_id = event.id().clone();
        let priority = event.priority();

        match self.shared.queue.enqueue(event).await {
            Ok(outcome) => {
                self.shared.counters.published();
                let displaced = match outcome {
                    Enqueued::Accepted => None,
                    Enqueued::DisplacedOldest(evicted) => {
                        tracing::warn!(
                            %priority,
                            evicted = %evicted.id(),
                            "queue full, dropped oldest event"
                        );
                        Some(evicted.id().clone())
                    }
                };
                tracing::debug!(%event_id, %priority, "published");
                Ok(Ack {
                    event_id,
                    priority,
                    displaced,
                })
            }
            Err(e) => {
                self.shared.counters.rejected();
                tracing::warn!(%event_id, %priority, error = %e, "publish refused");
                Err(e.into())
            }
        }
    }

    /// Register a filter and the subscriber-owned target it feeds
    pub fn subscribe<T: DeliveryTarget>(
        &self,
        filter: SubscriptionFilter,
        target: T,
    ) -> Result<SubscriptionId, SubscribeError> {
        self.subscribe_shared(filter, Arc::new(target))
    }

    /// Like `subscribe`, for a target already behind an `Arc`
    pub fn subscribe_shared(
        &self,
        filter: SubscriptionFilter,
        target: Arc<dyn DeliveryTarget>,
    ) -> Result<SubscriptionId, SubscribeError> {
        if !self.is_accepting() {
            return Err(SubscribeError::RouterClosed);
        }
        filter.validate(&self.shared.config.priority_levels)?;

        let id = SubscriptionId::generate(&self.shared.id_gen);
        let subscription = Subscription::new(id.clone(), filter, target, self.shared.clock.now());
        let target = subscription.target().describe();
        self.shared.registry.insert(subscription);

        // A shutdown that began after the first check may already have
        // purged the registry; take the entry back out.
        if !self.is_accepting() {
            let _ = self.shared.registry.deactivate(&id);
            self.shared.reap();
            return Err(SubscribeError::RouterClosed);
        }

        tracing::info!(subscription = %id, %target, "subscribed");
        Ok(id)
    }

    /// Subscribe with a filter in its textual form
    pub fn subscribe_spec<T: DeliveryTarget>(
        &self,
        spec: FilterSpec,
        target: T,
    ) -> Result<SubscriptionId, SubscribeError> {
        self.subscribe(SubscriptionFilter::try_from(spec)?, target)
    }

    /// Stop delivering to a subscription
    ///
    /// Events published after this returns are never delivered to it.
    /// Deliveries already in flight may still complete.
    pub fn unsubscribe(&self, id: &SubscriptionId) -> Result<(), NotFound> {
        self.shared.registry.deactivate(id)?;
        tracing::info!(subscription = %id, "unsubscribed");
        Ok(())
    }

    /// Launch dispatch workers and the reaper
    ///
    /// A `worker_count` of zero uses the configured count. Must be called
    /// from within a tokio runtime.
    pub fn start(&self, worker_count: usize) -> Result<(), StartError> {
        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(|e| e.into_inner());
        match *lifecycle {
            Lifecycle::Idle => {}
            Lifecycle::Running(_) => return Err(StartError::AlreadyStarted),
            Lifecycle::Stopped => return Err(StartError::ShutDown),
        }

        let count = if worker_count == 0 {
            self.shared.config.worker_count
        } else {
            worker_count
        };
        let dispatchers = (0..count)
            .map(|worker| tokio::spawn(dispatch::run_worker(Arc::clone(&self.shared), worker)))
            .collect();
        let reaper = tokio::spawn(run_reaper(Arc::clone(&self.shared)));

        *lifecycle = Lifecycle::Running(Workers {
            dispatchers,
            reaper,
        });
        tracing::info!(workers = count, "router started");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        matches!(
            *self.lifecycle.lock().unwrap_or_else(|e| e.into_inner()),
            Lifecycle::Running(_)
        )
    }

    /// Stop the router
    ///
    /// Both modes wait for deliveries already handed off to settle, which
    /// takes at most `delivery_timeout`.
    ///
    /// `Drain` delivers every queued event first; when no workers were
    /// started the caller's task does the draining. `Discard` drops queued
    /// events and reports how many. Either way the registry is purged.
    /// Later calls return an empty report.
    pub async fn shutdown(&self, mode: ShutdownMode) -> ShutdownReport {
        let previous = {
            let mut lifecycle = self.lifecycle.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::replace(&mut *lifecycle, Lifecycle::Stopped)
        };
        let workers = match previous {
            Lifecycle::Stopped => return ShutdownReport::default(),
            Lifecycle::Idle => None,
            Lifecycle::Running(workers) => Some(workers),
        };

        let shared = &self.shared;
        shared.accepting.store(false, Ordering::SeqCst);
        tracing::info!(?mode, pending = shared.queue.len(), "shutting down");

        let dispatched_before = shared.counters.dispatched_so_far();
        let mut report = ShutdownReport::default();
        match mode {
            ShutdownMode::Drain => shared.queue.close(),
            ShutdownMode::Discard => {
                report.discarded = shared.queue.close_and_discard();
                shared.counters.discarded(report.discarded);
                // Deliveries still waiting on a lane are skipped
                shared.registry.clear();
            }
        }

        match workers {
            Some(workers) => {
                workers.reaper.abort();
                let _ = workers.reaper.await;
                for handle in workers.dispatchers {
                    if let Err(e) = handle.await {
                        tracing::error!(error = %e, "dispatch worker failed");
                    }
                }
            }
            None if mode == ShutdownMode::Drain => {
                dispatch::run_worker(Arc::clone(shared), 0).await;
            }
            None => {}
        }
        shared.in_flight.settled().await;

        report.drained = shared.counters.dispatched_so_far() - dispatched_before;
        let purged = shared.registry.clear();
        tracing::info!(
            drained = report.drained,
            discarded = report.discarded,
            purged,
            "router stopped"
        );
        report
    }

    pub fn stats(&self) -> RouterStats {
        self.shared.counters.snapshot(self.shared.queue.dropped())
    }

    pub fn subscription_stats(&self, id: &SubscriptionId) -> Option<DeliveryStats> {
        self.shared.registry.get(id).map(|s| s.stats())
    }

    /// Every held subscription, oldest first
    pub fn subscriptions(&self) -> Vec<SubscriptionInfo> {
        self.shared.registry.list()
    }

    /// Events queued but not yet dispatched
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    /// Purge removed subscriptions now instead of waiting for the reaper
    pub fn reap(&self) -> usize {
        self.shared.reap()
    }
}

#[cfg(test)]
impl<C: Clock, I: IdGen> EventRouter<C, I> {
    pub(crate) fn shared(&self) -> &Arc<Shared<C, I>> {
        &self.shared
    }
}

impl<C: Clock, I: IdGen> Drop for EventRouter<C, I> {
    fn drop(&mut self) {
        // Workers exit once the closed queue is empty
        self.shared.accepting.store(false, Ordering::SeqCst);
        self.shared.queue.close();
        let lifecycle = self.lifecycle.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Lifecycle::Running(workers) = lifecycle {
            workers.reaper.abort();
        }
    }
}

async fn run_reaper<C: Clock, I: IdGen>(shared: Arc<Shared<C, I>>) {
    let mut ticker = tokio::time::interval(shared.config.reap_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;
    loop {
        ticker.tick().await;
        shared.reap();
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
