//! Configuration management for Lang-Monitor.
//!
//! Two layers:
//! - Runtime settings from command-line arguments and environment variables
//! - The monitor document (templates, defaults, batch, monitors, settings)

mod monitors;
mod settings;

pub use monitors::{BatchEntry, MonitorConfig, MonitorEntry, MonitorFields, NotifySettings};
pub use settings::{Config, DEFAULT_API_URL, DEFAULT_WEB_URL};
