// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced target wrapper for consistent observability

use super::{DeliveryError, DeliveryTarget};
use crate::event::Event;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::Instrument;

/// Wrapper that adds tracing to any DeliveryTarget
#[derive(Clone)]
pub struct TracedTarget<T> {
    inner: T,
}

impl<T> TracedTarget<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: DeliveryTarget> DeliveryTarget for TracedTarget<T> {
    async fn deliver(&self, event: Arc<Event>) -> Result<(), DeliveryError> {
        let span = tracing::info_span!(
            "target.deliver",
            target = %self.inner.describe(),
            event_id = %event.id(),
            event_type = %event.event_type(),
        );

        async {
            tracing::debug!(priority = %event.priority(), "delivering");

            let start = std::time::Instant::now();
            let result = self.inner.deliver(Arc::clone(&event)).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "delivered"),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "delivery failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::event::{EventFactory, EventType, NewEvent, Priority};
    use crate::id::SequentialIdGen;
    use crate::target::{FailingTarget, RecordingTarget};
    use serde_json::json;

    fn event() -> Arc<Event> {
        let factory = EventFactory::new(
            SystemClock,
            SequentialIdGen::new("tr"),
            Priority::ALL.to_vec(),
            1024,
        );
        Arc::new(
            factory
                .create(NewEvent::new(EventType::Agent, Priority::Normal, json!({})))
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn passes_deliveries_through() {
        let traced = TracedTarget::new(RecordingTarget::new("r"));
        traced.deliver(event()).await.unwrap();

        assert_eq!(traced.inner().count(), 1);
        assert_eq!(traced.describe(), "recording:r");
    }

    #[tokio::test]
    async fn passes_failures_through() {
        let traced = TracedTarget::new(FailingTarget::new());
        assert!(matches!(
            traced.deliver(event()).await,
            Err(DeliveryError::Rejected(_))
        ));
        assert_eq!(traced.inner().attempts(), 1);
    }
}
