// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration file
//!
//! ```toml
//! [router]
//! worker_count = 2
//!
//! [[subscription]]
//! name = "audit"
//! journal = "audit.jsonl"
//! filter = { types = ["task", "pr"], min_priority = "high" }
//! ```

use crate::lifecycle::DaemonError;
use evr_core::{FilterSpec, RouterConfig};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One journal subscription registered at startup
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscriptionConfig {
    pub name: String,
    /// Journal file; relative paths resolve against the config file's directory
    pub journal: PathBuf,
    #[serde(default)]
    pub filter: FilterSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    pub router: RouterConfig,
    #[serde(rename = "subscription")]
    pub subscriptions: Vec<SubscriptionConfig>,
}

impl DaemonConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, DaemonError> {
        let config: DaemonConfig = toml::from_str(content).map_err(evr_core::ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file and resolve journal paths against its directory
    pub fn load(path: &Path) -> Result<Self, DaemonError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| evr_core::ConfigError::Read(path.to_path_buf(), e))?;
        let mut config = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DaemonError> {
        self.router.validate()?;
        let mut names = HashSet::new();
        for subscription in &self.subscriptions {
            if !names.insert(subscription.name.as_str()) {
                return Err(DaemonError::DuplicateSubscription(
                    subscription.name.clone(),
                ));
            }
        }
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        for subscription in &mut self.subscriptions {
            if subscription.journal.is_relative() {
                subscription.journal = base.join(&subscription.journal);
            }
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
