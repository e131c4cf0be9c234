// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-subscription delivery ordering
//!
//! Dispatchers take a ticket for each matched subscription in the order they
//! pop events. A delivery waits until its ticket is being served and
//! finishes its turn afterwards, so a subscriber sees events in dispatch
//! order no matter how many dispatchers run.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

pub struct DeliveryLane {
    next_ticket: AtomicU64,
    serving: watch::Sender<u64>,
}

impl DeliveryLane {
    pub fn new() -> Self {
        let (serving, _) = watch::channel(0);
        Self {
            next_ticket: AtomicU64::new(0),
            serving,
        }
    }

    /// Reserve the next position in this lane
    pub fn take_ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::SeqCst)
    }

    /// Wait until every earlier ticket has finished
    pub async fn wait_turn(&self, ticket: u64) {
        let mut serving = self.serving.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = serving.wait_for(|current| *current >= ticket).await;
    }

    /// Hand the lane to the next ticket. Must be called exactly once per ticket.
    pub fn finish_turn(&self, ticket: u64) {
        self.serving.send_modify(|current| {
            if *current <= ticket {
                *current = ticket + 1;
            }
        });
    }

    /// Ticket currently allowed to deliver
    pub fn now_serving(&self) -> u64 {
        *self.serving.borrow()
    }
}

impl Default for DeliveryLane {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[test]
    fn tickets_are_sequential() {
        let lane = DeliveryLane::new();
        assert_eq!(lane.take_ticket(), 0);
        assert_eq!(lane.take_ticket(), 1);
        assert_eq!(lane.now_serving(), 0);
    }

    #[tokio::test]
    async fn later_ticket_waits_for_earlier() {
        let lane = Arc::new(DeliveryLane::new());
        let order = Arc::new(Mutex::new(Vec::new()));
        let first = lane.take_ticket();
        let second = lane.take_ticket();

        let waiter = {
            let lane = Arc::clone(&lane);
            let order = Arc::clone(&order);
            tokio::spawn(async move {
                lane.wait_turn(second).await;
                order.lock().unwrap().push(second);
                lane.finish_turn(second);
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(order.lock().unwrap().is_empty());

        lane.wait_turn(first).await;
        order.lock().unwrap().push(first);
        lane.finish_turn(first);

        waiter.await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec![0, 1]);
        assert_eq!(lane.now_serving(), 2);
    }
}
