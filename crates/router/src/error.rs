// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the router's public operations

use evr_core::{FilterError, Priority, QueueError, RegistryError, SubscriptionId, ValidationError};
use std::time::Duration;
use thiserror::Error;

/// Reasons `publish` refuses an event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("invalid event: {0}")]
    Validation(#[from] ValidationError),
    #[error("{level} queue is full ({capacity} events)")]
    QueueFull { level: Priority, capacity: usize },
    #[error("no space in {level} queue after {waited:?}")]
    Timeout { level: Priority, waited: Duration },
    #[error("router is closed")]
    RouterClosed,
}

impl From<QueueError> for PublishError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Full { level, capacity } => Self::QueueFull { level, capacity },
            QueueError::Timeout { level, waited } => Self::Timeout { level, waited },
            QueueError::Closed => Self::RouterClosed,
            QueueError::NoSuchLevel(priority) => {
                Self::Validation(ValidationError::UnsupportedPriority(priority))
            }
        }
    }
}

/// Reasons `subscribe` refuses a subscription
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscribeError {
    #[error("invalid filter: {0}")]
    InvalidFilter(#[from] FilterError),
    #[error("router is closed")]
    RouterClosed,
}

/// Unknown or already-inactive subscription
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("subscription not found: {0}")]
pub struct NotFound(pub SubscriptionId);

impl From<RegistryError> for NotFound {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(id) => Self(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("router is already running")]
    AlreadyStarted,
    #[error("router has been shut down")]
    ShutDown,
}
