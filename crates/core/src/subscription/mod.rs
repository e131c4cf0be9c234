// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscriptions: who wants which events
//!
//! This module provides:
//! - `SubscriptionFilter` - tagged predicate over type, priority and payload
//! - `SubscriptionRegistry` - copy-on-write map of live subscriptions
//! - `DeliveryLane` - per-subscription ticketing that keeps delivery order

mod filter;
mod lane;
mod registry;

pub use filter::{AttributeMatcher, FilterError, FilterSpec, SubscriptionFilter};
pub use lane::DeliveryLane;
pub use registry::{
    DeliveryStats, RegistryError, Subscription, SubscriptionInfo, SubscriptionRegistry,
};
