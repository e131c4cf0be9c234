// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription registry
//!
//! The map lives behind a copy-on-write `Arc`: matching clones the `Arc`
//! under a brief read lock and scans without holding it, so a long match
//! never blocks `subscribe`/`unsubscribe`. Unsubscribing only clears the
//! `active` flag; entries are purged later by `reap` so in-flight
//! deliveries keep a valid handle.

use super::filter::SubscriptionFilter;
use super::lane::DeliveryLane;
use crate::event::Event;
use crate::id::SubscriptionId;
use crate::target::DeliveryTarget;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;
use thiserror::Error;

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("subscription not found: {0}")]
    NotFound(SubscriptionId),
}

/// Per-subscription delivery counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub delivered: u64,
    pub failed: u64,
    pub timed_out: u64,
    /// Deliveries skipped because the subscription went inactive first
    pub skipped: u64,
    pub last_failure: Option<String>,
}

#[derive(Default)]
struct StatCells {
    delivered: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
    skipped: AtomicU64,
    last_failure: Mutex<Option<String>>,
}

/// A registered interest plus the subscriber-owned target
pub struct Subscription {
    id: SubscriptionId,
    filter: SubscriptionFilter,
    target: Arc<dyn DeliveryTarget>,
    created_at: Instant,
    active: AtomicBool,
    lane: DeliveryLane,
    stats: StatCells,
}

impl Subscription {
    pub fn new(
        id: SubscriptionId,
        filter: SubscriptionFilter,
        target: Arc<dyn DeliveryTarget>,
        created_at: Instant,
    ) -> Self {
        Self {
            id,
            filter,
            target,
            created_at,
            active: AtomicBool::new(true),
            lane: DeliveryLane::new(),
            stats: StatCells::default(),
        }
    }

    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    pub fn filter(&self) -> &SubscriptionFilter {
        &self.filter
    }

    pub fn target(&self) -> &Arc<dyn DeliveryTarget> {
        &self.target
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn lane(&self) -> &DeliveryLane {
        &self.lane
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Active and accepted by the filter
    pub fn matches(&self, event: &Event) -> bool {
        self.is_active() && self.filter.accepts(event)
    }

    /// Clear the active flag; false if it was already clear
    fn deactivate(&self) -> bool {
        self.active
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn record_delivered(&self) {
        self.stats.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, reason: impl Into<String>) {
        self.stats.failed.fetch_add(1, Ordering::Relaxed);
        *self
            .stats
            .last_failure
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(reason.into());
    }

    pub fn record_timeout(&self) {
        self.stats.timed_out.fetch_add(1, Ordering::Relaxed);
        *self
            .stats
            .last_failure
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some("delivery timed out".to_string());
    }

    pub fn record_skipped(&self) {
        self.stats.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> DeliveryStats {
        DeliveryStats {
            delivered: self.stats.delivered.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
            timed_out: self.stats.timed_out.load(Ordering::Relaxed),
            skipped: self.stats.skipped.load(Ordering::Relaxed),
            last_failure: self
                .stats
                .last_failure
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
        }
    }

    pub fn info(&self) -> SubscriptionInfo {
        SubscriptionInfo {
            id: self.id.clone(),
            filter: self.filter.clone(),
            target: self.target.describe(),
            created_at: self.created_at,
            active: self.is_active(),
            stats: self.stats(),
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("filter", &self.filter)
            .field("target", &self.target.describe())
            .field("active", &self.is_active())
            .finish()
    }
}

/// Point-in-time view of a subscription
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionInfo {
    pub id: SubscriptionId,
    pub filter: SubscriptionFilter,
    pub target: String,
    pub created_at: Instant,
    pub active: bool,
    pub stats: DeliveryStats,
}

type Entries = HashMap<SubscriptionId, Arc<Subscription>>;

/// Map of subscriptions shared by dispatchers (readers) and management calls
/// (writers)
#[derive(Default)]
pub struct SubscriptionRegistry {
    entries: RwLock<Arc<Entries>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> Arc<Entries> {
        Arc::clone(&self.entries.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// Apply `f` to a private copy of the map, then publish the copy
    fn update<R>(&self, f: impl FnOnce(&mut Entries) -> R) -> R {
        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let mut next = Entries::clone(&guard);
        let result = f(&mut next);
        *guard = Arc::new(next);
        result
    }

    pub fn insert(&self, subscription: Subscription) -> Arc<Subscription> {
        let subscription = Arc::new(subscription);
        self.update(|entries| {
            entries.insert(subscription.id().clone(), Arc::clone(&subscription));
        });
        subscription
    }

    /// Mark a subscription inactive
    ///
    /// Unknown and already-inactive ids fail with `NotFound`.
    pub fn deactivate(&self, id: &SubscriptionId) -> Result<Arc<Subscription>, RegistryError> {
        let subscription = self
            .snapshot()
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;

        if subscription.deactivate() {
            Ok(subscription)
        } else {
            Err(RegistryError::NotFound(id.clone()))
        }
    }

    /// Active subscriptions whose filter accepts the event
    pub fn matching(&self, event: &Event) -> Vec<Arc<Subscription>> {
        let mut matched: Vec<_> = self
            .snapshot()
            .values()
            .filter(|s| s.matches(event))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.id().cmp(b.id()));
        matched
    }

    pub fn get(&self, id: &SubscriptionId) -> Option<Arc<Subscription>> {
        self.snapshot().get(id).cloned()
    }

    /// Entries still held, including inactive ones awaiting reaping
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.snapshot().values().filter(|s| s.is_active()).count()
    }

    /// Every entry, oldest first
    pub fn list(&self) -> Vec<SubscriptionInfo> {
        let mut infos: Vec<_> = self.snapshot().values().map(|s| s.info()).collect();
        infos.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        infos
    }

    /// Purge inactive entries, returning how many were removed
    pub fn reap(&self) -> usize {
        self.update(|entries| {
            let before = entries.len();
            entries.retain(|_, s| s.is_active());
            before - entries.len()
        })
    }

    /// Deactivate and purge everything, returning how many entries were held
    pub fn clear(&self) -> usize {
        self.update(|entries| {
            for subscription in entries.values() {
                subscription.deactivate();
            }
            let n = entries.len();
            entries.clear();
            n
        })
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
