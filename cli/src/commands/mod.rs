//! # Packrat Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! This module aggregates the top-level `packrat` subcommands and makes them
//! accessible to the main application entry point (`main.rs`).
//!
//! ## Commands
//!
//! - `pack`: Create an archive from inputs below a base directory
//! - `unpack`: Extract an archive into a destination directory
//! - `list`: Print the entries of an archive without extracting it
//! - `probe`: Report filesystem facts about a path
//!
//! Each command defines its own arguments structure and an async handler.
//! The archive operations themselves are synchronous; handlers run them on a
//! blocking task via `run_interruptible` so Ctrl-C can abandon them.
//!
use anyhow::anyhow;
use packrat::core::error::{ArchiveResult, Result};
use tracing::{debug, warn};

/// Creates tar archives from a base directory and a list of inputs.
pub mod pack;
/// Extracts tar archives (plain, gzip, bzip2).
pub mod unpack;
/// Lists the entries of an archive.
pub mod list;
/// Filesystem probes (existence, size, type, modify time, file listing).
pub mod probe;

/// Runs a blocking archive operation on tokio's blocking pool, racing it
/// against Ctrl-C.
///
/// On interruption the operation's result is discarded and an error is
/// returned; whatever it already wrote stays on disk.
pub(crate) async fn run_interruptible<T, F>(label: &'static str, op: F) -> Result<T>
where
    F: FnOnce() -> ArchiveResult<T> + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::task::spawn_blocking(op);
    tokio::select! {
        joined = task => {
            let outcome = joined.map_err(|e| anyhow!("{} task failed: {}", label, e))?;
            debug!("{} finished (ok: {})", label, outcome.is_ok());
            outcome.map_err(anyhow::Error::from)
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("{} interrupted; partial output may remain on disk", label);
            Err(anyhow!("{} interrupted", label))
        }
    }
}
