//! Automation side-channel output.
//!
//! CI hosts expose a key/value file (`GITHUB_OUTPUT`) that later workflow
//! steps read. Each run appends whether anything changed and how much.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::Result;

/// Append `has_updates` and `update_count` to the output file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or written.
pub fn write_outputs(path: &Path, update_count: usize) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    write!(
        file,
        "has_updates={}\nupdate_count={update_count}\n",
        update_count > 0
    )?;
    tracing::debug!(path = %path.display(), update_count, "Automation outputs written");
    Ok(())
}
