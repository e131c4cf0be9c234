// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event model: the immutable value that flows through the router
//!
//! Producers describe an occurrence with a [`NewEvent`] draft. The
//! [`EventFactory`] validates the draft, assigns the id and creation
//! instant, and produces an [`Event`] that is never mutated again.

use crate::clock::Clock;
use crate::config::RouterConfig;
use crate::id::{EventId, IdGen};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use thiserror::Error;

/// Domain tag of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Task,
    Pr,
    Agent,
    Workflow,
    System,
    Custom,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        EventType::Task,
        EventType::Pr,
        EventType::Agent,
        EventType::Workflow,
        EventType::System,
        EventType::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Task => "task",
            EventType::Pr => "pr",
            EventType::Agent => "agent",
            EventType::Workflow => "workflow",
            EventType::System => "system",
            EventType::Custom => "custom",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownType(s.to_string()))
    }
}

/// Delivery priority; `Critical` is the highest
///
/// Variant order gives the ordering, so `Priority::Critical > Priority::Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
    Critical,
}

impl Priority {
    /// Highest first
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Normal,
        Priority::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownPriority(s.to_string()))
    }
}

/// Reasons an event is refused before it reaches a queue
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown event type: {0:?}")]
    UnknownType(String),
    #[error("unknown priority: {0:?}")]
    UnknownPriority(String),
    #[error("priority {0} is not a configured level")]
    UnsupportedPriority(Priority),
    #[error("payload is {size} bytes, limit is {max}")]
    PayloadTooLarge { size: usize, max: usize },
    #[error("payload is not serializable: {0}")]
    Payload(String),
}

/// Producer-supplied description of an event, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub priority: Priority,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl NewEvent {
    pub fn new(event_type: EventType, priority: Priority, payload: serde_json::Value) -> Self {
        Self {
            event_type,
            priority,
            payload,
            correlation_id: None,
        }
    }

    /// Build a draft from textual type and priority names
    pub fn parse(
        event_type: &str,
        priority: &str,
        payload: serde_json::Value,
    ) -> Result<Self, ValidationError> {
        Ok(Self::new(event_type.parse()?, priority.parse()?, payload))
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

/// An immutable occurrence; only [`EventFactory`] creates one
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    id: EventId,
    event_type: EventType,
    priority: Priority,
    payload: serde_json::Value,
    created_at: Instant,
    correlation_id: Option<String>,
}

impl Event {
    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }
}

/// Validates drafts and stamps them with an id and creation instant
#[derive(Clone, Debug)]
pub struct EventFactory<C: Clock, I: IdGen> {
    clock: C,
    id_gen: I,
    levels: Vec<Priority>,
    max_payload_bytes: usize,
}

impl<C: Clock, I: IdGen> EventFactory<C, I> {
    pub fn new(clock: C, id_gen: I, levels: Vec<Priority>, max_payload_bytes: usize) -> Self {
        Self {
            clock,
            id_gen,
            levels,
            max_payload_bytes,
        }
    }

    pub fn from_config(config: &RouterConfig, clock: C, id_gen: I) -> Self {
        Self::new(
            clock,
            id_gen,
            config.priority_levels.clone(),
            config.max_payload_bytes,
        )
    }

    pub fn create(&self, draft: NewEvent) -> Result<Event, ValidationError> {
        if !self.levels.contains(&draft.priority) {
            return Err(ValidationError::UnsupportedPriority(draft.priority));
        }

        let size = serde_json::to_vec(&draft.payload)
            .map_err(|e| ValidationError::Payload(e.to_string()))?
            .len();
        if size > self.max_payload_bytes {
            return Err(ValidationError::PayloadTooLarge {
                size,
                max: self.max_payload_bytes,
            });
        }

        Ok(Event {
            id: EventId::generate(&self.id_gen),
            event_type: draft.event_type,
            priority: draft.priority,
            payload: draft.payload,
            created_at: self.clock.now(),
            correlation_id: draft.correlation_id,
        })
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
