// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;
use crate::event::{EventFactory, EventType, NewEvent};
use crate::id::SequentialIdGen;
use serde_json::json;

fn make_event(n: u64) -> Arc<Event> {
    let factory = EventFactory::new(
        FakeClock::new(),
        SequentialIdGen::new(format!("q{}", n)),
        Priority::ALL.to_vec(),
        1024,
    );
    Arc::new(
        factory
            .create(NewEvent::new(EventType::Task, Priority::Normal, json!({ "n": n })))
            .unwrap(),
    )
}

fn queue(capacity: usize, policy: BackpressurePolicy) -> EventQueue {
    EventQueue::new(
        Priority::Normal,
        capacity,
        policy,
        Duration::from_millis(50),
    )
}

fn n_of(event: &Event) -> u64 {
    event.payload()["n"].as_u64().unwrap()
}

#[tokio::test]
async fn queue_is_fifo() {
    let q = queue(4, BackpressurePolicy::Reject);
    for n in 0..3 {
        q.enqueue(make_event(n)).await.unwrap();
    }

    let mut order = Vec::new();
    while let Some(event) = q.try_dequeue() {
        order.push(n_of(&event));
    }
    assert_eq!(order, vec![0, 1, 2]);
}

#[tokio::test]
async fn reject_policy_fails_when_full_and_keeps_length() {
    let q = queue(2, BackpressurePolicy::Reject);
    q.enqueue(make_event(0)).await.unwrap();
    q.enqueue(make_event(1)).await.unwrap();

    let err = q.enqueue(make_event(2)).await.unwrap_err();

    assert_eq!(
        err,
        QueueError::Full {
            level: Priority::Normal,
            capacity: 2
        }
    );
    assert_eq!(q.len(), 2);
    assert_eq!(q.dropped(), 0);
}

#[tokio::test]
async fn drop_oldest_evicts_head_and_counts() {
    let q = queue(2, BackpressurePolicy::DropOldest);
    q.enqueue(make_event(0)).await.unwrap();
    q.enqueue(make_event(1)).await.unwrap();

    let outcome = q.enqueue(make_event(2)).await.unwrap();

    match outcome {
        Enqueued::DisplacedOldest(evicted) => assert_eq!(n_of(&evicted), 0),
        other => panic!("expected eviction, got {:?}", other),
    }
    assert_eq!(q.len(), 2);
    assert_eq!(q.dropped(), 1);
    assert_eq!(n_of(&q.try_dequeue().unwrap()), 1);
    assert_eq!(n_of(&q.try_dequeue().unwrap()), 2);
}

#[tokio::test]
async fn block_policy_times_out_when_no_space_frees() {
    let q = queue(1, BackpressurePolicy::Block);
    q.enqueue(make_event(0)).await.unwrap();

    let err = q.enqueue(make_event(1)).await.unwrap_err();

    assert!(matches!(err, QueueError::Timeout { level: Priority::Normal, .. }));
    assert_eq!(q.len(), 1);
}

#[tokio::test]
async fn block_policy_resumes_when_space_frees() {
    let q = Arc::new(EventQueue::new(
        Priority::Normal,
        1,
        BackpressurePolicy::Block,
        Duration::from_secs(5),
    ));
    q.enqueue(make_event(0)).await.unwrap();

    let producer = {
        let q = Arc::clone(&q);
        tokio::spawn(async move { q.enqueue(make_event(1)).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(n_of(&q.try_dequeue().unwrap()), 0);

    assert_eq!(producer.await.unwrap(), Ok(Enqueued::Accepted));
    assert_eq!(n_of(&q.try_dequeue().unwrap()), 1);
}

#[tokio::test]
async fn try_enqueue_never_waits_under_block_policy() {
    let q = queue(1, BackpressurePolicy::Block);
    q.try_enqueue(make_event(0)).unwrap();
    assert!(matches!(
        q.try_enqueue(make_event(1)),
        Err(QueueError::Full { .. })
    ));
}

#[tokio::test]
async fn dequeue_waits_for_an_item() {
    let q = Arc::new(queue(4, BackpressurePolicy::Reject));

    let consumer = {
        let q = Arc::clone(&q);
        tokio::spawn(async move { q.dequeue().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    q.enqueue(make_event(7)).await.unwrap();

    match consumer.await.unwrap() {
        Dequeued::Event(event) => assert_eq!(n_of(&event), 7),
        Dequeued::Closed => panic!("queue was not closed"),
    }
}

#[tokio::test]
async fn close_wakes_blocked_dequeuer() {
    let q = Arc::new(queue(4, BackpressurePolicy::Reject));

    let consumer = {
        let q = Arc::clone(&q);
        tokio::spawn(async move { q.dequeue().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    q.close();

    assert_eq!(consumer.await.unwrap(), Dequeued::Closed);
}

#[tokio::test]
async fn close_wakes_blocked_enqueuer() {
    let q = Arc::new(EventQueue::new(
        Priority::Normal,
        1,
        BackpressurePolicy::Block,
        Duration::from_secs(5),
    ));
    q.enqueue(make_event(0)).await.unwrap();

    let producer = {
        let q = Arc::clone(&q);
        tokio::spawn(async move { q.enqueue(make_event(1)).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    q.close();

    assert_eq!(producer.await.unwrap(), Err(QueueError::Closed));
}

#[tokio::test]
async fn closed_queue_drains_then_reports_closed() {
    let q = queue(4, BackpressurePolicy::Reject);
    q.enqueue(make_event(0)).await.unwrap();
    q.close();
    q.close();

    assert_eq!(q.enqueue(make_event(1)).await, Err(QueueError::Closed));
    assert!(matches!(q.dequeue().await, Dequeued::Event(_)));
    assert_eq!(q.dequeue().await, Dequeued::Closed);
}

#[tokio::test]
async fn discard_empties_and_counts() {
    let q = queue(8, BackpressurePolicy::Reject);
    for n in 0..5 {
        q.enqueue(make_event(n)).await.unwrap();
    }
    assert_eq!(q.discard(), 5);
    assert!(q.is_empty());
}
