// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;
use crate::event::{EventFactory, NewEvent};
use crate::id::SequentialIdGen;
use serde_json::json;
use yare::parameterized;

fn event(event_type: EventType, priority: Priority, payload: Value) -> Event {
    EventFactory::new(
        FakeClock::new(),
        SequentialIdGen::new("f"),
        Priority::ALL.to_vec(),
        4096,
    )
    .create(NewEvent::new(event_type, priority, payload))
    .unwrap()
}

#[test]
fn empty_filter_accepts_everything() {
    let filter = SubscriptionFilter::all();
    for event_type in EventType::ALL {
        for priority in Priority::ALL {
            assert!(filter.accepts(&event(event_type, priority, json!(null))));
        }
    }
}

#[test]
fn type_set_restricts_types() {
    let filter = SubscriptionFilter::for_types([EventType::Task, EventType::Pr]);
    assert!(filter.accepts(&event(EventType::Task, Priority::Low, json!(null))));
    assert!(filter.accepts(&event(EventType::Pr, Priority::Low, json!(null))));
    assert!(!filter.accepts(&event(EventType::System, Priority::Low, json!(null))));
}

#[parameterized(
    below_floor = { Priority::Normal, false },
    at_floor = { Priority::High, true },
    above_floor = { Priority::Critical, true },
)]
fn priority_floor(priority: Priority, accepted: bool) {
    let filter = SubscriptionFilter::all().with_min_priority(Priority::High);
    assert_eq!(
        filter.accepts(&event(EventType::Task, priority, json!(null))),
        accepted
    );
}

#[test]
fn attribute_matcher_applies_to_payload() {
    let filter = SubscriptionFilter::for_types([EventType::Pr])
        .with_attributes(AttributeMatcher::equals("/repo", "evr"));

    assert!(filter.accepts(&event(EventType::Pr, Priority::Normal, json!({"repo": "evr"}))));
    assert!(!filter.accepts(&event(EventType::Pr, Priority::Normal, json!({"repo": "other"}))));
    assert!(!filter.accepts(&event(EventType::Pr, Priority::Normal, json!({}))));
}

#[test]
fn matcher_combinators() {
    let payload = json!({"pr": {"number": 12, "state": "open"}, "draft": false});

    assert!(AttributeMatcher::exists("/pr/number").matches(&payload));
    assert!(!AttributeMatcher::exists("/pr/title").matches(&payload));
    assert!(AttributeMatcher::one_of("/pr/state", vec![json!("open"), json!("merged")])
        .matches(&payload));
    assert!(AttributeMatcher::exists("/pr/title").negate().matches(&payload));

    let all = AttributeMatcher::All {
        matchers: vec![
            AttributeMatcher::equals("/pr/number", 12),
            AttributeMatcher::equals("/draft", false),
        ],
    };
    assert!(all.matches(&payload));

    let any = AttributeMatcher::Any {
        matchers: vec![
            AttributeMatcher::equals("/pr/number", 99),
            AttributeMatcher::equals("/draft", true),
        ],
    };
    assert!(!any.matches(&payload));
}

#[test]
fn empty_path_addresses_whole_payload() {
    assert!(AttributeMatcher::equals("", "ping").matches(&json!("ping")));
}

#[parameterized(
    relative_path = { AttributeMatcher::exists("pr/number"), FilterError::InvalidPath("pr/number".to_string()) },
    empty_all = { AttributeMatcher::All { matchers: vec![] }, FilterError::EmptyGroup },
    nested_bad_path = {
        AttributeMatcher::Any { matchers: vec![AttributeMatcher::exists("x")] }.negate(),
        FilterError::InvalidPath("x".to_string())
    },
)]
fn invalid_matchers(matcher: AttributeMatcher, expected: FilterError) {
    let filter = SubscriptionFilter::all().with_attributes(matcher);
    assert_eq!(filter.validate(&Priority::ALL), Err(expected));
}

#[test]
fn floor_must_be_a_configured_level() {
    let filter = SubscriptionFilter::all().with_min_priority(Priority::Critical);
    assert_eq!(
        filter.validate(&[Priority::High, Priority::Low]),
        Err(FilterError::UnsupportedPriority(Priority::Critical))
    );
    assert_eq!(filter.validate(&Priority::ALL), Ok(()));
}

#[test]
fn spec_converts_names() {
    let spec = FilterSpec {
        types: vec!["task".to_string(), "PR".to_string()],
        min_priority: Some("high".to_string()),
        attributes: None,
    };
    let filter = SubscriptionFilter::try_from(spec).unwrap();
    assert_eq!(
        filter.types,
        [EventType::Task, EventType::Pr].into_iter().collect()
    );
    assert_eq!(filter.min_priority, Some(Priority::High));
}

#[test]
fn spec_rejects_unknown_type() {
    let spec = FilterSpec {
        types: vec!["task".to_string(), "deploy".to_string()],
        ..FilterSpec::default()
    };
    assert_eq!(
        SubscriptionFilter::try_from(spec),
        Err(FilterError::UnknownType("deploy".to_string()))
    );
}

#[test]
fn spec_rejects_unknown_priority() {
    let spec = FilterSpec {
        min_priority: Some("urgent".to_string()),
        ..FilterSpec::default()
    };
    assert_eq!(
        SubscriptionFilter::try_from(spec),
        Err(FilterError::UnknownPriority("urgent".to_string()))
    );
}

#[test]
fn spec_deserializes_from_toml() {
    let spec: FilterSpec = toml::from_str(
        r#"
        types = ["pr"]
        min_priority = "normal"
        attributes = { op = "equals", path = "/repo", value = "evr" }
        "#,
    )
    .unwrap();

    assert_eq!(
        spec.attributes,
        Some(AttributeMatcher::equals("/repo", "evr"))
    );
}
