//! Monitor expansion and change detection.
//!
//! This module provides:
//! - Glob/regex expansion against a repository file tree
//! - Expansion of templates, defaults and batch shorthands into concrete monitors
//! - The detection pass comparing latest commits with the persisted snapshot

mod detector;
mod events;
mod expand;
mod pattern;

pub use detector::{detect, Detection, DetectionStats};
pub use events::{short_sha, UpdateEvent, WatchKey};
pub use expand::{
    expand_monitors, repo_short_name, substitute_vars, MonitorSpec, DEFAULT_BRANCH,
};
pub use pattern::{expand_pattern, PatternKind};
