//! Lang-Monitor - remote file change monitor
//!
//! Entry point for a single monitoring pass.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use lang_monitor::github::GitHubClient;
use lang_monitor::notify::Channels;
use lang_monitor::observability::{init_tracing, TracingConfig};
use lang_monitor::{App, Config, Result};

/// Lang-Monitor - watch files in GitHub repositories for new commits
#[derive(Parser, Debug)]
#[command(name = "lang-monitor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Monitor configuration file (JSON)
    #[arg(short, long, env = "LANG_MONITOR_CONFIG", default_value = "config/monitors.json")]
    config: std::path::PathBuf,

    /// Persisted state file (JSON)
    #[arg(short, long, env = "LANG_MONITOR_STATE", default_value = "data/state.json")]
    state: std::path::PathBuf,

    /// GitHub API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = lang_monitor::config::DEFAULT_API_URL)]
    api_url: String,

    /// GitHub web base URL used in links
    #[arg(long, env = "GITHUB_SERVER_URL", default_value = lang_monitor::config::DEFAULT_WEB_URL)]
    web_url: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LANG_MONITOR_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "LANG_MONITOR_LOG_JSON")]
    log_json: bool,

    /// File receiving automation outputs (has_updates, update_count)
    #[arg(long, env = "GITHUB_OUTPUT")]
    github_output: Option<std::path::PathBuf>,

    /// Detect and save state without sending notifications
    #[arg(long)]
    no_notify: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&TracingConfig {
        level: cli.log_level.clone(),
        json: cli.log_json,
    });

    tracing::info!("Lang-Monitor v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config {
        config_path: cli.config,
        state_path: cli.state,
        github_token: cli.github_token,
        api_url: cli.api_url,
        web_url: cli.web_url,
        log_level: cli.log_level,
        github_output: cli.github_output,
        no_notify: cli.no_notify,
    };
    config.validate()?;

    tracing::debug!(
        config = %config.config_path.display(),
        state = %config.state_path.display(),
        api = %config.api_url,
        "Configuration loaded"
    );

    let client = GitHubClient::new(&config.api_url, config.token().map(String::from))?;
    tracing::debug!(authenticated = client.is_authenticated(), "GitHub client ready");
    let channels = if config.no_notify {
        Channels::default()
    } else {
        Channels::from_env()
    };

    let summary = App::new(config, client, channels).run().await?;

    tracing::info!(
        has_updates = summary.has_updates(),
        updates = summary.updates.len(),
        monitors = summary.stats.monitors_checked,
        paths = summary.stats.paths_checked,
        notified = summary.notifications.iter().filter(|o| o.is_success()).count(),
        "Run complete"
    );
    Ok(())
}
