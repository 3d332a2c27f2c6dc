//! Runtime settings and validation.

use crate::{Error, Result};
use std::path::PathBuf;

/// Default GitHub REST API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default GitHub web endpoint used for browsing links.
pub const DEFAULT_WEB_URL: &str = "https://github.com";

/// Runtime configuration for one monitoring pass.
#[derive(Debug, Clone)]
pub struct Config {
    /// Monitor configuration document (JSON).
    pub config_path: PathBuf,

    /// Persisted run state (JSON).
    pub state_path: PathBuf,

    /// Optional API token used to raise rate limits.
    pub github_token: Option<String>,

    /// REST API base URL.
    pub api_url: String,

    /// Web base URL for compare/commit/file links.
    pub web_url: String,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Append-only automation output file.
    pub github_output: Option<PathBuf>,

    /// Skip every notification channel.
    pub no_notify: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("config/monitors.json"),
            state_path: PathBuf::from("data/state.json"),
            github_token: None,
            api_url: DEFAULT_API_URL.to_string(),
            web_url: DEFAULT_WEB_URL.to_string(),
            log_level: "info".to_string(),
            github_output: None,
            no_notify: false,
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.config_path.as_os_str().is_empty() {
            return Err(Error::config("config path cannot be empty"));
        }

        if self.state_path.as_os_str().is_empty() {
            return Err(Error::config("state path cannot be empty"));
        }

        for (name, url) in [("api url", &self.api_url), ("web url", &self.web_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::config(format!(
                    "{name} '{url}' must start with http:// or https://"
                )));
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Token with empty values treated as absent.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.github_token.as_deref().filter(|t| !t.trim().is_empty())
    }
}
