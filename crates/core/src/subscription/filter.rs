// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription filters
//!
//! A filter accepts an event when:
//!   - the event type is in `types` (an empty set accepts every type)
//!   - the priority is at least `min_priority`, when set
//!   - `attributes` matches the payload, when set
//!
//! Attribute paths are JSON pointers into the payload: `/pr/number`.

use crate::event::{Event, EventType, Priority};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use thiserror::Error;

/// Filter construction and validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("unknown event type: {0:?}")]
    UnknownType(String),
    #[error("unknown priority: {0:?}")]
    UnknownPriority(String),
    #[error("priority floor {0} is not a configured level")]
    UnsupportedPriority(Priority),
    #[error("attribute path {0:?} is not a JSON pointer")]
    InvalidPath(String),
    #[error("attribute group has no matchers")]
    EmptyGroup,
}

/// Predicate over an event payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AttributeMatcher {
    Exists { path: String },
    Equals { path: String, value: Value },
    OneOf { path: String, values: Vec<Value> },
    All { matchers: Vec<AttributeMatcher> },
    Any { matchers: Vec<AttributeMatcher> },
    Not { matcher: Box<AttributeMatcher> },
}

impl AttributeMatcher {
    pub fn exists(path: impl Into<String>) -> Self {
        Self::Exists { path: path.into() }
    }

    pub fn equals(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn one_of(path: impl Into<String>, values: Vec<Value>) -> Self {
        Self::OneOf {
            path: path.into(),
            values,
        }
    }

    pub fn negate(self) -> Self {
        Self::Not {
            matcher: Box::new(self),
        }
    }

    pub fn matches(&self, payload: &Value) -> bool {
        match self {
            Self::Exists { path } => payload.pointer(path).is_some(),
            Self::Equals { path, value } => payload.pointer(path) == Some(value),
            Self::OneOf { path, values } => payload
                .pointer(path)
                .is_some_and(|found| values.contains(found)),
            Self::All { matchers } => matchers.iter().all(|m| m.matches(payload)),
            Self::Any { matchers } => matchers.iter().any(|m| m.matches(payload)),
            Self::Not { matcher } => !matcher.matches(payload),
        }
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        match self {
            Self::Exists { path } | Self::Equals { path, .. } | Self::OneOf { path, .. } => {
                if path.is_empty() || path.starts_with('/') {
                    Ok(())
                } else {
                    Err(FilterError::InvalidPath(path.clone()))
                }
            }
            Self::All { matchers } | Self::Any { matchers } => {
                if matchers.is_empty() {
                    return Err(FilterError::EmptyGroup);
                }
                matchers.iter().try_for_each(AttributeMatcher::validate)
            }
            Self::Not { matcher } => matcher.validate(),
        }
    }
}

/// Which events a subscription receives
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionFilter {
    pub types: BTreeSet<EventType>,
    pub min_priority: Option<Priority>,
    pub attributes: Option<AttributeMatcher>,
}

impl SubscriptionFilter {
    /// Accept every event
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_types(types: impl IntoIterator<Item = EventType>) -> Self {
        Self {
            types: types.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_min_priority(mut self, priority: Priority) -> Self {
        self.min_priority = Some(priority);
        self
    }

    pub fn with_attributes(mut self, matcher: AttributeMatcher) -> Self {
        self.attributes = Some(matcher);
        self
    }

    pub fn accepts(&self, event: &Event) -> bool {
        if !self.types.is_empty() && !self.types.contains(&event.event_type()) {
            return false;
        }
        if self.min_priority.is_some_and(|floor| event.priority() < floor) {
            return false;
        }
        self.attributes
            .as_ref()
            .map_or(true, |matcher| matcher.matches(event.payload()))
    }

    /// Check the filter against the router's configured priority levels
    pub fn validate(&self, levels: &[Priority]) -> Result<(), FilterError> {
        if let Some(floor) = self.min_priority {
            if !levels.contains(&floor) {
                return Err(FilterError::UnsupportedPriority(floor));
            }
        }
        match &self.attributes {
            Some(matcher) => matcher.validate(),
            None => Ok(()),
        }
    }
}

/// Textual filter form used in configuration files
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSpec {
    pub types: Vec<String>,
    pub min_priority: Option<String>,
    pub attributes: Option<AttributeMatcher>,
}

impl TryFrom<FilterSpec> for SubscriptionFilter {
    type Error = FilterError;

    fn try_from(spec: FilterSpec) -> Result<Self, Self::Error> {
        let types = spec
            .types
            .iter()
            .map(|name| {
                name.parse::<EventType>()
                    .map_err(|_| FilterError::UnknownType(name.clone()))
            })
            .collect::<Result<BTreeSet<_>, _>>()?;

        let min_priority = spec
            .min_priority
            .map(|name| {
                name.parse::<Priority>()
                    .map_err(|_| FilterError::UnknownPriority(name))
            })
            .transpose()?;

        Ok(Self {
            types,
            min_priority,
            attributes: spec.attributes,
        })
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
