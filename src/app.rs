//! One complete monitoring pass.
//!
//! Loads the monitor configuration and persisted state, runs detection,
//! persists the new state, then fans out notifications and automation
//! outputs. Only configuration and persistence failures are returned.

use crate::actions;
use crate::config::{Config, MonitorConfig};
use crate::github::RepoClient;
use crate::notify::{self, ChannelOutcome, Channels};
use crate::storage::{load_state, save_state};
use crate::watcher::{detect, expand_monitors, DetectionStats, UpdateEvent};
use crate::{Error, Result};

/// Result of a completed run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub updates: Vec<UpdateEvent>,
    pub stats: DetectionStats,
    pub notifications: Vec<ChannelOutcome>,
}

impl RunSummary {
    #[must_use]
    pub fn has_updates(&self) -> bool {
        !self.updates.is_empty()
    }
}

/// Monitoring application.
pub struct App<C> {
    config: Config,
    client: C,
    channels: Channels,
}

impl<C: RepoClient> App<C> {
    /// Create a new application.
    ///
    /// # Arguments
    ///
    /// * `config` - Runtime configuration
    /// * `client` - Remote directory client
    /// * `channels` - Notification channels to use when updates are found
    #[must_use]
    pub const fn new(config: Config, client: C, channels: Channels) -> Self {
        Self {
            config,
            client,
            channels,
        }
    }

    /// Run one pass.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoMonitors`] if nothing is configured, and an error if
    /// the configuration is malformed or the state cannot be saved. Failures
    /// on individual paths and notification channels are only logged.
    pub async fn run(&self) -> Result<RunSummary> {
        let monitors = MonitorConfig::load(&self.config.config_path)?;
        if !monitors.has_monitors() {
            return Err(Error::NoMonitors);
        }

        if self.config.token().is_none() {
            tracing::warn!("No GitHub token configured, requests are subject to low rate limits");
        }

        let specs = expand_monitors(&monitors);
        tracing::info!(monitors = specs.len(), "Monitors resolved");

        let prior = load_state(&self.config.state_path);
        let detection = detect(&specs, prior, &self.client, &self.config.web_url).await;

        save_state(&self.config.state_path, &detection.state)?;
        tracing::info!(
            path = %self.config.state_path.display(),
            entries = detection.state.len(),
            "State saved"
        );

        let notifications = if detection.events.is_empty() {
            Vec::new()
        } else if self.config.no_notify {
            tracing::info!("Notifications disabled for this run");
            Vec::new()
        } else if self.channels.is_empty() {
            tracing::warn!(
                updates = detection.events.len(),
                "Updates found but no notification channel is configured"
            );
            Vec::new()
        } else {
            notify::dispatch(&self.channels, &detection.events, &monitors.settings).await
        };

        if let Some(path) = &self.config.github_output {
            if let Err(e) = actions::write_outputs(path, detection.events.len()) {
                tracing::warn!(path = %path.display(), error = %e, "Failed to write automation outputs");
            }
        }

        report(&detection.events);

        Ok(RunSummary {
            updates: detection.events,
            stats: detection.stats,
            notifications,
        })
    }
}

fn report(updates: &[UpdateEvent]) {
    if updates.is_empty() {
        tracing::info!("No updates, all monitored files are unchanged");
        return;
    }

    tracing::info!(count = updates.len(), "Updates detected");
    for update in updates {
        tracing::info!(
            name = %update.name,
            path = %update.path,
            old = %update.old_sha,
            new = %update.new_sha,
            "{}: {}",
            update.name,
            update.path
        );
    }
}
