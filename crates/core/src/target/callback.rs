// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Target that runs a synchronous closure per event

use super::{DeliveryError, DeliveryTarget};
use crate::event::Event;
use async_trait::async_trait;
use std::sync::Arc;

type Callback = dyn Fn(&Event) -> Result<(), DeliveryError> + Send + Sync;

/// Calls a closure for each delivered event
///
/// The closure runs on the dispatcher's runtime; it should not block.
#[derive(Clone)]
pub struct CallbackTarget {
    name: String,
    callback: Arc<Callback>,
}

impl CallbackTarget {
    pub fn new<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&Event) -> Result<(), DeliveryError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            callback: Arc::new(callback),
        }
    }
}

#[async_trait]
impl DeliveryTarget for CallbackTarget {
    async fn deliver(&self, event: Arc<Event>) -> Result<(), DeliveryError> {
        (self.callback)(&event)
    }

    fn describe(&self) -> String {
        format!("callback:{}", self.name)
    }
}
