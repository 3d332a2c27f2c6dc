//! Flat key-value snapshot of the last observed commit per watch key.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tempfile::NamedTempFile;

use crate::watcher::WatchKey;
use crate::{Error, Result};

/// Last known commit for one watch key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub last_sha: String,
    /// Informational only; detection compares `last_sha`.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_check: Option<DateTime<Utc>>,
}

impl SnapshotEntry {
    #[must_use]
    pub fn new(last_sha: impl Into<String>, last_check: DateTime<Utc>) -> Self {
        Self {
            last_sha: last_sha.into(),
            last_check: Some(last_check),
        }
    }
}

/// Persisted state: `{ "monitors": { "<repo>:<branch>:<path>": {..} }, "last_check": .. }`.
///
/// Keys are never pruned automatically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    #[serde(default, deserialize_with = "lenient_entries")]
    pub monitors: BTreeMap<String, SnapshotEntry>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_check: Option<DateTime<Utc>>,
}

impl RunState {
    /// Snapshot for a key, if one was ever recorded.
    #[must_use]
    pub fn get(&self, key: &WatchKey) -> Option<&SnapshotEntry> {
        self.monitors.get(&key.to_string())
    }

    /// Record `sha` as the current identifier for `key`.
    pub fn record(&mut self, key: &WatchKey, sha: &str, at: DateTime<Utc>) {
        self.monitors
            .insert(key.to_string(), SnapshotEntry::new(sha, at));
    }

    /// Number of tracked keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    /// Whether no key has ever been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

/// Parse an RFC 3339 timestamp, or a naive ISO-8601 one taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Unparseable or missing timestamps become `None` instead of failing the file.
fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(parse_timestamp))
}

/// Entries that cannot be read are dropped one by one; the rest survive.
fn lenient_entries<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, SnapshotEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value(value) {
            Ok(entry) => Some((key, entry)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Dropping unreadable state entry");
                None
            }
        })
        .collect())
}

/// Load the persisted state.
///
/// A missing file is an empty state. An unreadable or malformed file is
/// logged and also treated as empty: every key is then re-baselined
/// without notifying.
#[must_use]
pub fn load_state(path: &Path) -> RunState {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "No previous state, starting fresh");
            return RunState::default();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read state, starting fresh");
            return RunState::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Malformed state file, starting fresh");
            RunState::default()
        }
    }
}

/// Write the whole state atomically (temp file in the same directory, then rename).
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot be written.
pub fn save_state(path: &Path, state: &RunState) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let json = serde_json::to_string_pretty(state)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| Error::state(format!("failed to replace {}: {}", path.display(), e.error)))?;

    tracing::debug!(path = %path.display(), keys = state.len(), "State saved");
    Ok(())
}
