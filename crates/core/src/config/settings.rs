// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Router configuration
//!
//! Loaded from TOML; every key is optional and falls back to the defaults
//! below. Durations use humantime notation (`"250ms"`, `"5s"`).

use crate::event::Priority;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// What `enqueue` does when a level is at capacity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackpressurePolicy {
    /// Wait for space until `enqueue_timeout` elapses
    Block,
    /// Fail immediately with a full-queue error
    #[default]
    Reject,
    /// Evict the oldest queued event to make room
    DropOldest,
}

/// Tunables for one router instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Priority levels served by the router, highest first
    pub priority_levels: Vec<Priority>,
    pub queue_capacity_per_level: usize,
    pub backpressure_policy: BackpressurePolicy,
    /// How long a `block` enqueue waits for space
    #[serde(with = "humantime_serde")]
    pub enqueue_timeout: Duration,
    /// Age after which a lower-priority event jumps ahead; zero disables aging
    #[serde(with = "humantime_serde")]
    pub max_wait_aging: Duration,
    #[serde(with = "humantime_serde")]
    pub delivery_timeout: Duration,
    pub worker_count: usize,
    pub max_payload_bytes: usize,
    /// Period of the background pass that purges unsubscribed entries
    #[serde(with = "humantime_serde")]
    pub reap_interval: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            priority_levels: Priority::ALL.to_vec(),
            queue_capacity_per_level: 1024,
            backpressure_policy: BackpressurePolicy::Reject,
            enqueue_timeout: Duration::from_secs(1),
            max_wait_aging: Duration::from_secs(5),
            delivery_timeout: Duration::from_secs(2),
            worker_count: 4,
            max_payload_bytes: 64 * 1024,
            reap_interval: Duration::from_secs(30),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("priority_levels must not be empty")]
    NoLevels,

    #[error("priority level {0} is listed more than once")]
    DuplicateLevel(Priority),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

impl RouterConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RouterConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.priority_levels.is_empty() {
            return Err(ConfigError::NoLevels);
        }
        for (i, level) in self.priority_levels.iter().enumerate() {
            if self.priority_levels[..i].contains(level) {
                return Err(ConfigError::DuplicateLevel(*level));
            }
        }

        let positive = [
            ("queue_capacity_per_level", self.queue_capacity_per_level),
            ("worker_count", self.worker_count),
            ("max_payload_bytes", self.max_payload_bytes),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::Zero(name));
            }
        }
        if self.delivery_timeout.is_zero() {
            return Err(ConfigError::Zero("delivery_timeout"));
        }
        if self.reap_interval.is_zero() {
            return Err(ConfigError::Zero("reap_interval"));
        }
        Ok(())
    }

    /// Configured levels sorted highest first
    pub fn levels_highest_first(&self) -> Vec<Priority> {
        let mut levels = self.priority_levels.clone();
        levels.sort_by(|a, b| b.cmp(a));
        levels
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
