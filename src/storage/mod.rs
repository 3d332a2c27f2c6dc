//! Persistence of per-path snapshots between runs.
//!
//! The state file is read once at start and replaced once at the end.
//! Concurrent runs against the same file are not supported.

mod state;

pub use state::{load_state, save_state, RunState, SnapshotEntry};
