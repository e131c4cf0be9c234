// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

use crate::config::DaemonConfig;
use evr_core::{ConfigError, JournalError, JournalTarget, SubscriptionId, TracedTarget};
use evr_router::{EventRouter, RouterStats, ShutdownMode, StartError, SubscribeError};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

/// Errors that stop the daemon from starting
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("subscription {0:?} is defined more than once")]
    DuplicateSubscription(String),

    #[error("failed to open journal for subscription {name:?}: {source}")]
    Journal {
        name: String,
        #[source]
        source: JournalError,
    },

    #[error("failed to register subscription {name:?}: {source}")]
    Subscribe {
        name: String,
        #[source]
        source: SubscribeError,
    },

    #[error("failed to start router: {0}")]
    Start(#[from] StartError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Running daemon state
pub struct Daemon {
    pub router: EventRouter,
    /// Configured subscriptions by name
    pub subscriptions: Vec<(String, SubscriptionId)>,
}

/// Final summary printed on exit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExitReport {
    pub drained: u64,
    pub discarded: usize,
    pub stats: RouterStats,
}

/// Build the router, register configured journals and start dispatching
///
/// Must be called from within a tokio runtime.
pub fn startup(config: DaemonConfig, workers: Option<usize>) -> Result<Daemon, DaemonError> {
    let router = EventRouter::new(config.router)?;

    let mut subscriptions = Vec::with_capacity(config.subscriptions.len());
    for subscription in config.subscriptions {
        let name = subscription.name;
        let journal =
            JournalTarget::open(&subscription.journal).map_err(|source| DaemonError::Journal {
                name: name.clone(),
                source,
            })?;
        let id = router
            .subscribe_spec(subscription.filter, TracedTarget::new(journal))
            .map_err(|source| DaemonError::Subscribe {
                name: name.clone(),
                source,
            })?;
        info!(%name, subscription = %id, journal = %subscription.journal.display(), "registered journal");
        subscriptions.push((name, id));
    }

    router.start(workers.unwrap_or(0))?;
    Ok(Daemon {
        router,
        subscriptions,
    })
}

impl Daemon {
    pub async fn shutdown(&self, mode: ShutdownMode) -> ExitReport {
        info!(?mode, pending = self.router.pending(), "stopping router");
        let report = self.router.shutdown(mode).await;
        ExitReport {
            drained: report.drained,
            discarded: report.discarded,
            stats: self.router.stats(),
        }
    }
}
