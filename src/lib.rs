//! Lang-Monitor Library
//!
//! Watches files in remote GitHub repositories and reports when the latest
//! commit touching a watched path changes between runs. Designed to be run
//! periodically by a scheduler; each invocation performs a single pass.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod actions;
pub mod app;
pub mod config;
pub mod error;
pub mod github;
pub mod notify;
pub mod observability;
pub mod storage;
pub mod watcher;

pub use app::{App, RunSummary};
pub use config::Config;
pub use error::{Error, Result};
