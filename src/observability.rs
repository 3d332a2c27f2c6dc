//! Structured logging configuration.
//!
//! Provides setup for observability using the `tracing` crate with:
//! - Plain text or JSON output
//! - `RUST_LOG` override of the configured level
//! - Spans for monitors and notification channels

use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

/// Tracing configuration options.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable JSON output format
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Initialize tracing with the given configuration.
///
/// # Panics
///
/// Panics if a tracing subscriber has already been initialized in this process.
pub fn init_tracing(config: &TracingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        let json_layer = fmt::layer().json().with_target(true);
        Registry::default().with(env_filter).with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer().with_target(false);
        Registry::default().with(env_filter).with(fmt_layer).init();
    }

    tracing::debug!(level = %config.level, json = config.json, "Tracing initialized");
}

/// Spans shared across the run.
pub mod spans {
    use tracing::{info_span, Span};

    /// Span wrapping the checks of one monitor.
    #[must_use]
    pub fn monitor_span(name: &str, repo: &str, branch: &str) -> Span {
        info_span!("monitor", name = %name, repo = %repo, branch = %branch)
    }

    /// Span wrapping one notification channel.
    #[must_use]
    pub fn notify_span(channel: &str) -> Span {
        info_span!("notify", channel = %channel)
    }
}
