// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbox target backed by a bounded tokio channel

use super::{DeliveryError, DeliveryTarget};
use crate::event::Event;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Sender for event delivery
pub type EventSender = mpsc::Sender<Arc<Event>>;
/// Receiver for event delivery
pub type EventReceiver = mpsc::Receiver<Arc<Event>>;

/// Delivers into a subscriber-owned `mpsc` inbox
///
/// A full inbox makes `deliver` wait, so the router's delivery timeout
/// bounds how long a slow reader can hold a delivery. A dropped receiver is
/// reported as `Closed`.
#[derive(Clone, Debug)]
pub struct ChannelTarget {
    name: String,
    tx: EventSender,
}

impl ChannelTarget {
    pub fn new(name: impl Into<String>, tx: EventSender) -> Self {
        Self {
            name: name.into(),
            tx,
        }
    }

    /// Create a target together with the inbox it feeds
    pub fn channel(name: impl Into<String>, buffer: usize) -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self::new(name, tx), rx)
    }
}

#[async_trait]
impl DeliveryTarget for ChannelTarget {
    async fn deliver(&self, event: Arc<Event>) -> Result<(), DeliveryError> {
        self.tx.send(event).await.map_err(|_| DeliveryError::Closed)
    }

    fn describe(&self) -> String {
        format!("channel:{}", self.name)
    }
}
