//! Notification channels.
//!
//! Each configured channel receives one message per run summarising every
//! update. A failing channel is logged and reported in the outcome list but
//! never aborts the run or prevents the other channels from sending.

mod email;
mod todo;

pub use email::{
    build_message, render_html, render_subject, render_text, send_email, EmailConfig,
};
pub use todo::{send_todo, TodoClient, TodoConfig, DEFAULT_GRAPH_URL, DEFAULT_TOKEN_URL};

use tracing::Instrument;

use crate::config::NotifySettings;
use crate::error::NotifyError;
use crate::observability::spans;
use crate::watcher::UpdateEvent;

/// Group updates by repository, keeping first-seen order.
pub(crate) fn group_by_repo(updates: &[UpdateEvent]) -> Vec<(&str, Vec<&UpdateEvent>)> {
    let mut groups: Vec<(&str, Vec<&UpdateEvent>)> = Vec::new();
    for update in updates {
        match groups.iter().position(|(repo, _)| *repo == update.repo) {
            Some(idx) => groups[idx].1.push(update),
            None => groups.push((update.repo.as_str(), vec![update])),
        }
    }
    groups
}

/// Channels that are configured for this run.
#[derive(Debug, Clone, Default)]
pub struct Channels {
    pub email: Option<EmailConfig>,
    pub todo: Option<TodoConfig>,
}

impl Channels {
    /// Read channel credentials from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Read channel credentials from a variable lookup.
    ///
    /// Unconfigured channels are skipped with a warning. Partially configured
    /// channels are logged as errors and disabled.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let email = enable("email", EmailConfig::from_vars(&lookup));
        let todo = enable("todo", TodoConfig::from_vars(&lookup));
        Self { email, todo }
    }

    /// True if no channel can send.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none() && self.todo.is_none()
    }
}

fn enable<T>(channel: &str, loaded: Result<Option<T>, NotifyError>) -> Option<T> {
    match loaded {
        Ok(Some(config)) => {
            tracing::debug!(channel, "Notification channel configured");
            Some(config)
        }
        Ok(None) => {
            tracing::warn!(channel, "Notification channel not configured, skipping");
            None
        }
        Err(e) => {
            tracing::error!(channel, error = %e, "Notification channel disabled");
            None
        }
    }
}

/// Result of one channel delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOutcome {
    pub channel: &'static str,
    pub error: Option<String>,
}

impl ChannelOutcome {
    fn from_result(channel: &'static str, result: Result<(), NotifyError>) -> Self {
        match result {
            Ok(()) => {
                tracing::info!(channel, "Notification sent");
                Self {
                    channel,
                    error: None,
                }
            }
            Err(e) => {
                tracing::error!(channel, error = %e, "Notification failed");
                Self {
                    channel,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// True if the channel delivered.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Send `updates` through every configured channel.
///
/// Returns one outcome per attempted channel. Nothing is sent for an empty
/// update list.
pub async fn dispatch(
    channels: &Channels,
    updates: &[UpdateEvent],
    settings: &NotifySettings,
) -> Vec<ChannelOutcome> {
    let mut outcomes = Vec::new();
    if updates.is_empty() {
        return outcomes;
    }

    if let Some(config) = &channels.email {
        let result = send_email(config, updates, settings)
            .instrument(spans::notify_span("email"))
            .await;
        outcomes.push(ChannelOutcome::from_result("email", result));
    }

    if let Some(config) = &channels.todo {
        let result = send_todo(config, updates, settings)
            .instrument(spans::notify_span("todo"))
            .await;
        outcomes.push(ChannelOutcome::from_result("todo", result));
    }

    outcomes
}
