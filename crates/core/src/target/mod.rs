// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery targets: where a subscription's events go
//!
//! The subscriber owns the receiving side of its target; the router only
//! holds an `Arc` and calls `deliver`. A target must finish within the
//! router's delivery timeout or the attempt is abandoned.

mod callback;
mod channel;
#[cfg(any(test, feature = "test-support"))]
mod fake;
mod journal;
mod traced;

use crate::event::Event;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use callback::CallbackTarget;
pub use channel::{ChannelTarget, EventReceiver, EventSender};
pub use journal::{JournalError, JournalRecord, JournalTarget};
pub use traced::TracedTarget;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FailingTarget, PanickingTarget, RecordingTarget, StallingTarget};

/// Errors a target reports for a single delivery
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("target is closed")]
    Closed,
    #[error("target buffer is full")]
    Full,
    #[error("target rejected event: {0}")]
    Rejected(String),
}

/// Subscriber-side sink for delivered events
#[async_trait]
pub trait DeliveryTarget: Send + Sync + 'static {
    async fn deliver(&self, event: Arc<Event>) -> Result<(), DeliveryError>;

    /// Short label for logs and subscription listings
    fn describe(&self) -> String {
        "target".to_string()
    }
}
