// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! evr-core: building blocks of the event router
//!
//! This crate provides:
//! - The validated `Event` model and the factory that stamps ids and times
//! - Bounded per-priority queues with backpressure and aging
//! - Subscription filters and the copy-on-write registry
//! - Delivery targets that subscribers own
//! - Router configuration loaded from TOML

pub mod clock;
pub mod config;
pub mod event;
pub mod id;
pub mod queue;
pub mod subscription;
pub mod target;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{BackpressurePolicy, ConfigError, RouterConfig};
pub use event::{Event, EventFactory, EventType, NewEvent, Priority, ValidationError};
pub use id::{EventId, IdGen, SequentialIdGen, SubscriptionId, UuidIdGen};
pub use queue::{Dequeued, Enqueued, EventQueue, MultiQueue, QueueError};
pub use subscription::{
    AttributeMatcher, DeliveryLane, DeliveryStats, FilterError, FilterSpec, RegistryError,
    Subscription, SubscriptionFilter, SubscriptionInfo, SubscriptionRegistry,
};
pub use target::{
    CallbackTarget, ChannelTarget, DeliveryError, DeliveryTarget, EventReceiver, EventSender,
    JournalError, JournalRecord, JournalTarget, TracedTarget,
};

#[cfg(any(test, feature = "test-support"))]
pub use target::{FailingTarget, PanickingTarget, RecordingTarget, StallingTarget};
