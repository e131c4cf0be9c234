// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;
use crate::id::SequentialIdGen;
use serde_json::json;
use std::time::Duration;
use yare::parameterized;

fn factory(max_payload_bytes: usize) -> EventFactory<FakeClock, SequentialIdGen> {
    EventFactory::new(
        FakeClock::new(),
        SequentialIdGen::new("e"),
        Priority::ALL.to_vec(),
        max_payload_bytes,
    )
}

#[test]
fn priorities_order_critical_highest() {
    assert!(Priority::Critical > Priority::High);
    assert!(Priority::High > Priority::Normal);
    assert!(Priority::Normal > Priority::Low);
}

#[parameterized(
    lowercase = { "task", EventType::Task },
    uppercase = { "PR", EventType::Pr },
    mixed_case = { "Workflow", EventType::Workflow },
    padded = { " system ", EventType::System },
)]
fn event_type_parses(input: &str, expected: EventType) {
    assert_eq!(input.parse::<EventType>().unwrap(), expected);
}

#[parameterized(
    critical = { "CRITICAL", Priority::Critical },
    high = { "high", Priority::High },
    normal = { "Normal", Priority::Normal },
    low = { "low", Priority::Low },
)]
fn priority_parses(input: &str, expected: Priority) {
    assert_eq!(input.parse::<Priority>().unwrap(), expected);
}

#[test]
fn unknown_names_are_validation_errors() {
    assert_eq!(
        NewEvent::parse("deploy", "high", json!({})),
        Err(ValidationError::UnknownType("deploy".to_string()))
    );
    assert_eq!(
        NewEvent::parse("task", "urgent", json!({})),
        Err(ValidationError::UnknownPriority("urgent".to_string()))
    );
}

#[test]
fn factory_assigns_unique_ids_and_creation_time() {
    let clock = FakeClock::new();
    let factory = EventFactory::new(
        clock.clone(),
        SequentialIdGen::new("e"),
        Priority::ALL.to_vec(),
        1024,
    );
    let start = clock.now();

    let first = factory
        .create(NewEvent::new(EventType::Task, Priority::High, json!({"n": 1})))
        .unwrap();
    clock.advance(Duration::from_secs(1));
    let second = factory
        .create(NewEvent::new(EventType::Task, Priority::High, json!({"n": 2})))
        .unwrap();

    assert_ne!(first.id(), second.id());
    assert_eq!(first.created_at(), start);
    assert_eq!(second.created_at(), start + Duration::from_secs(1));
}

#[test]
fn factory_keeps_producer_fields() {
    let event = factory(1024)
        .create(
            NewEvent::new(EventType::Pr, Priority::Low, json!({"number": 7}))
                .with_correlation_id("flow-1"),
        )
        .unwrap();

    assert_eq!(event.event_type(), EventType::Pr);
    assert_eq!(event.priority(), Priority::Low);
    assert_eq!(event.payload(), &json!({"number": 7}));
    assert_eq!(event.correlation_id(), Some("flow-1"));
}

#[test]
fn factory_rejects_oversized_payload() {
    let payload = json!({"body": "x".repeat(64)});
    let err = factory(32)
        .create(NewEvent::new(EventType::Custom, Priority::Normal, payload))
        .unwrap_err();
    assert!(matches!(err, ValidationError::PayloadTooLarge { max: 32, .. }));
}

#[test]
fn factory_rejects_priority_outside_configured_levels() {
    let factory = EventFactory::new(
        FakeClock::new(),
        SequentialIdGen::new("e"),
        vec![Priority::High, Priority::Low],
        1024,
    );
    let err = factory
        .create(NewEvent::new(EventType::Task, Priority::Critical, json!(null)))
        .unwrap_err();
    assert_eq!(err, ValidationError::UnsupportedPriority(Priority::Critical));
}

#[test]
fn new_event_deserializes_from_json_line() {
    let line = r#"{"type":"agent","priority":"critical","payload":{"agent":"coder"},"correlation_id":"c-9"}"#;
    let draft: NewEvent = serde_json::from_str(line).unwrap();
    assert_eq!(draft.event_type, EventType::Agent);
    assert_eq!(draft.priority, Priority::Critical);
    assert_eq!(draft.payload, json!({"agent": "coder"}));
    assert_eq!(draft.correlation_id.as_deref(), Some("c-9"));
}

#[test]
fn new_event_payload_defaults_to_null() {
    let draft: NewEvent = serde_json::from_str(r#"{"type":"system","priority":"low"}"#).unwrap();
    assert_eq!(draft.payload, serde_json::Value::Null);
}
