//! Typed schema for the monitor configuration document.
//!
//! ```json
//! {
//!   "templates": { "i18n": { "paths_glob": ["locales/*.json"] } },
//!   "defaults":  { "branch": "main" },
//!   "batch":     [ { "repos": ["o/a", "o/b"], "paths": ["lang/en.json"] } ],
//!   "monitors":  [ { "repo": "o/c", "template": "i18n" } ],
//!   "settings":  { "email_subject_prefix": "[Lang-Monitor]" }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Optional monitor fields shared by templates, defaults, batch and monitor entries.
///
/// Every field is optional so that layers can be merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<String>>,
    #[serde(alias = "pathsGlob", skip_serializing_if = "Option::is_none")]
    pub paths_glob: Option<Vec<String>>,
    #[serde(alias = "pathsRegex", skip_serializing_if = "Option::is_none")]
    pub paths_regex: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vars: Option<BTreeMap<String, String>>,
}

impl MonitorFields {
    /// Apply `upper` on top of `self`: every field set in `upper` wins.
    pub fn overlay(&mut self, upper: &Self) {
        fn pick<T: Clone>(slot: &mut Option<T>, upper: &Option<T>) {
            if upper.is_some() {
                slot.clone_from(upper);
            }
        }

        pick(&mut self.repo, &upper.repo);
        pick(&mut self.branch, &upper.branch);
        pick(&mut self.name, &upper.name);
        pick(&mut self.paths, &upper.paths);
        pick(&mut self.paths_glob, &upper.paths_glob);
        pick(&mut self.paths_regex, &upper.paths_regex);
        pick(&mut self.enabled, &upper.enabled);
        pick(&mut self.vars, &upper.vars);
    }

    /// Merge layers ordered from lowest to highest precedence.
    #[must_use]
    pub fn layered<'a>(layers: impl IntoIterator<Item = &'a Self>) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.overlay(layer);
        }
        merged
    }
}

/// A `monitors` entry (also the shape of `defaults`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorEntry {
    /// Name of a template to backfill unset fields from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    #[serde(flatten)]
    pub fields: MonitorFields,
}

/// A `batch` entry: shared fields applied to several repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchEntry {
    pub repos: Vec<String>,

    #[serde(flatten)]
    pub fields: MonitorFields,
}

/// Notification formatting toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySettings {
    /// Include the first line of the commit message.
    pub include_commit_message: bool,

    /// Include the compare (diff) link.
    pub include_diff_link: bool,

    /// Prefix for email subjects.
    pub email_subject_prefix: String,

    /// Display name on the From header.
    pub email_sender_name: String,

    /// To-do list receiving update tasks.
    pub todo_list_name: String,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            include_commit_message: true,
            include_diff_link: true,
            email_subject_prefix: "[Lang-Monitor]".to_string(),
            email_sender_name: "Lang-Monitor".to_string(),
            todo_list_name: "Lang-Monitor".to_string(),
        }
    }
}

/// The whole monitor configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub templates: BTreeMap<String, MonitorFields>,
    pub defaults: MonitorEntry,
    pub batch: Vec<BatchEntry>,
    pub monitors: Vec<MonitorEntry>,
    pub settings: NotifySettings,
}

impl MonitorConfig {
    /// Parse a configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON or does not match the schema.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load the configuration document from disk.
    ///
    /// A missing file yields an empty configuration; the caller decides
    /// whether that is fatal via [`MonitorConfig::has_monitors`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_json(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Monitor configuration not found");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Whether `monitors` or `batch` declares anything.
    #[must_use]
    pub fn has_monitors(&self) -> bool {
        !self.monitors.is_empty() || !self.batch.is_empty()
    }
}
