//! Change detection over resolved monitors.
//!
//! For each enabled monitor the effective path set is its literal paths plus
//! every glob and regex match against the branch tree. Each `(repo, branch,
//! path)` is checked at most once per run. A key seen for the first time is
//! recorded as a baseline and never produces an event.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tracing::Instrument;

use super::events::{short_sha, UpdateEvent, WatchKey};
use super::expand::MonitorSpec;
use super::pattern::{expand_pattern, PatternKind};
use crate::github::RepoClient;
use crate::observability::spans;
use crate::storage::RunState;

/// Counters for one detection pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DetectionStats {
    pub monitors_checked: u64,
    pub monitors_disabled: u64,
    pub paths_checked: u64,
    pub duplicates: u64,
    pub baselined: u64,
    pub unchanged: u64,
    pub updated: u64,
    pub no_history: u64,
    pub fetch_errors: u64,
    pub pattern_errors: u64,
    pub tree_fetches: u64,
}

/// Output of a detection pass.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Changes detected this run, in check order.
    pub events: Vec<UpdateEvent>,
    /// Prior state with this run's baselines and updates applied.
    pub state: RunState,
    pub stats: DetectionStats,
}

/// Run one detection pass.
///
/// Errors on individual trees, patterns or paths are logged and skipped;
/// the pass itself cannot fail. The caller persists the returned state.
pub async fn detect<C>(
    specs: &[MonitorSpec],
    prior: RunState,
    client: &C,
    web_url: &str,
) -> Detection
where
    C: RepoClient + ?Sized,
{
    let mut pass = DetectionPass {
        client,
        web_url,
        state: prior,
        events: Vec::new(),
        stats: DetectionStats::default(),
        seen: HashSet::new(),
        trees: HashMap::new(),
    };

    for spec in specs {
        if !spec.enabled {
            tracing::info!(name = %spec.name, repo = %spec.repo, "Skipping disabled monitor");
            pass.stats.monitors_disabled += 1;
            continue;
        }

        let span = spans::monitor_span(&spec.name, &spec.repo, &spec.branch);
        pass.check_monitor(spec).instrument(span).await;
    }

    pass.state.last_check = Some(Utc::now());

    let stats = pass.stats;
    tracing::info!(
        monitors = stats.monitors_checked,
        disabled = stats.monitors_disabled,
        paths = stats.paths_checked,
        baselined = stats.baselined,
        unchanged = stats.unchanged,
        updated = stats.updated,
        errors = stats.fetch_errors,
        "Detection pass complete"
    );

    Detection {
        events: pass.events,
        state: pass.state,
        stats,
    }
}

struct DetectionPass<'a, C: ?Sized> {
    client: &'a C,
    web_url: &'a str,
    state: RunState,
    events: Vec<UpdateEvent>,
    stats: DetectionStats,
    seen: HashSet<WatchKey>,
    /// Per-run tree cache keyed by `(repo, branch)`; failures are cached too.
    trees: HashMap<(String, String), Option<Arc<Vec<String>>>>,
}

impl<C> DetectionPass<'_, C>
where
    C: RepoClient + ?Sized,
{
    async fn check_monitor(&mut self, spec: &MonitorSpec) {
        tracing::info!("Checking monitor");
        self.stats.monitors_checked += 1;

        let paths = self.resolve_paths(spec).await;
        for path in &paths {
            self.check_path(spec, path).await;
        }
    }

    async fn resolve_paths(&mut self, spec: &MonitorSpec) -> Vec<String> {
        let mut paths = spec.paths.clone();
        if !spec.needs_tree() {
            return paths;
        }

        let tree = self.tree(&spec.repo, &spec.branch).await;

        let patterns = spec
            .paths_glob
            .iter()
            .map(|p| (p, PatternKind::Glob))
            .chain(spec.paths_regex.iter().map(|p| (p, PatternKind::Regex)));

        for (pattern, kind) in patterns {
            let Some(tree) = tree.as_deref() else {
                tracing::warn!(pattern = %pattern, kind = kind.label(), "File tree unavailable, skipping pattern");
                continue;
            };

            match expand_pattern(tree, pattern, kind) {
                Ok(matched) if matched.is_empty() => {
                    tracing::warn!(pattern = %pattern, kind = kind.label(), "No files matched");
                }
                Ok(matched) => {
                    tracing::info!(pattern = %pattern, kind = kind.label(), matched = matched.len(), "Expanded pattern");
                    paths.extend(matched);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping invalid pattern");
                    self.stats.pattern_errors += 1;
                }
            }
        }

        paths
    }

    async fn tree(&mut self, repo: &str, branch: &str) -> Option<Arc<Vec<String>>> {
        let cache_key = (repo.to_string(), branch.to_string());
        if let Some(cached) = self.trees.get(&cache_key) {
            return cached.clone();
        }

        self.stats.tree_fetches += 1;
        let fetched = match self.client.file_tree(repo, branch).await {
            Ok(tree) => {
                tracing::debug!(files = tree.len(), "Fetched file tree");
                Some(Arc::new(tree))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch file tree");
                self.stats.fetch_errors += 1;
                None
            }
        };

        self.trees.insert(cache_key, fetched.clone());
        fetched
    }

    async fn check_path(&mut self, spec: &MonitorSpec, path: &str) {
        let key = WatchKey::new(&spec.repo, &spec.branch, path);
        if !self.seen.insert(key.clone()) {
            self.stats.duplicates += 1;
            return;
        }
        self.stats.paths_checked += 1;

        let commit = match self
            .client
            .latest_commit(&spec.repo, &spec.branch, path)
            .await
        {
            Ok(Some(commit)) => commit,
            Ok(None) => {
                tracing::warn!(path, "No commit history");
                self.stats.no_history += 1;
                return;
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "Failed to fetch latest commit");
                self.stats.fetch_errors += 1;
                return;
            }
        };

        let previous = self.state.get(&key).map(|entry| entry.last_sha.clone());
        match previous {
            None => {
                tracing::info!(path, sha = short_sha(&commit.sha), "First observation, recording baseline");
                self.state.record(&key, &commit.sha, Utc::now());
                self.stats.baselined += 1;
            }
            Some(old) if old != commit.sha => {
                tracing::info!(
                    path,
                    old = short_sha(&old),
                    new = short_sha(&commit.sha),
                    "Update detected"
                );
                self.events
                    .push(UpdateEvent::new(self.web_url, &spec.name, &key, &old, &commit));
                self.state.record(&key, &commit.sha, Utc::now());
                self.stats.updated += 1;
            }
            Some(_) => {
                tracing::debug!(path, "Unchanged");
                self.stats.unchanged += 1;
            }
        }
    }
}
