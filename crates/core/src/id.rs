// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier generation and the typed ids built from it

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generates unique identifiers
pub trait IdGen: Clone + Send + Sync + 'static {
    fn next(&self) -> String;
}

/// UUID-based ID generator for production use
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Sequential ID generator for testing
///
/// Clones share the counter.
#[derive(Clone, Debug)]
pub struct SequentialIdGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, n)
    }
}

/// Unique identifier of a published event
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub String);

/// Unique identifier of a subscription
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub String);

impl EventId {
    pub fn generate(id_gen: &impl IdGen) -> Self {
        Self(format!("evt-{}", id_gen.next()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl SubscriptionId {
    pub fn generate(id_gen: &impl IdGen) -> Self {
        Self(format!("sub-{}", id_gen.next()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_gen_creates_unique_ids() {
        let id_gen = UuidIdGen;
        let id1 = id_gen.next();
        let id2 = id_gen.next();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 36); // UUID format
    }

    #[test]
    fn sequential_gen_is_shared_between_clones() {
        let id_gen1 = SequentialIdGen::new("shared");
        let id_gen2 = id_gen1.clone();
        assert_eq!(id_gen1.next(), "shared-1");
        assert_eq!(id_gen2.next(), "shared-2");
        assert_eq!(id_gen1.next(), "shared-3");
    }

    #[test]
    fn typed_ids_carry_a_kind_prefix() {
        let id_gen = SequentialIdGen::new("t");
        assert_eq!(EventId::generate(&id_gen).as_str(), "evt-t-1");
        assert_eq!(SubscriptionId::generate(&id_gen).to_string(), "sub-t-2");
    }
}
