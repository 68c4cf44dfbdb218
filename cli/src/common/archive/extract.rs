//! # Packrat Extraction Engine (`common::archive::extract`)
//!
//! File: cli/src/common/archive/extract.rs
//!
//! ## Overview
//!
//! Materializes a decoded tar entry stream under a destination directory. All
//! three reader front-ends (plain, gzip, bzip2) end up here once their
//! decompression filter is in place.
//!
//! ## Per-entry behaviour
//!
//! - **Directory**: created with its ancestors if missing; an existing
//!   directory is reused, so re-extraction is idempotent. The recorded mode
//!   is applied after all entries are written (deepest first), which keeps a
//!   read-only directory from blocking its own contents.
//! - **Regular file**: missing parents are created with
//!   `ExtractOptions::parent_dir_mode`; any existing file or symlink at the
//!   destination is unlinked, then the file is created, its content streamed
//!   in, and its mode set. Replacing instead of truncating means a read-only
//!   file from an earlier run doesn't block the next one.
//! - **Pax metadata** (global and per-file extended headers) carries no
//!   filesystem object and is skipped silently under every policy.
//!
//! Existing directories inside `dest_dir` that lack owner write or search
//! permission are opened up while entries land in them, and their previous
//! mode goes back on in the final pass.
//! - **Symlink**: created from the recorded target. Anything already at that
//!   path is an `AlreadyExists` error. The link's own mode is not restored
//!   (see `links::restore_symlink_mode`).
//! - **Other** (hard links, devices, FIFOs): skipped with a warning, or an
//!   `Unsupported` error under `UnsupportedPolicy::Error`.
//!
//! Entry names go through `sanitize` first: absolute names, names that climb
//! out with `..`, and names below an in-tree symlink are `PathEscape` errors.
//!
//! Processing is strictly in stream order and stops at the first error. What
//! was already written stays on disk; there is no rollback.
//!
use super::entry::{ArchiveEntry, EntryKind};
use super::sanitize::{ensure_no_symlink_ancestors, normalize_entry_name};
use crate::common::fs::{io as fsio, links, probe};
use crate::core::error::{ArchiveError, ArchiveResult};
use serde::Deserialize;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Mode for parent directories created implicitly for file and link entries.
pub const DEFAULT_PARENT_DIR_MODE: u32 = 0o775;

/// What to do with entries the engine can't materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsupportedPolicy {
    /// Drop the entry and keep going.
    #[default]
    Skip,
    /// Abort with `ArchiveError::Unsupported`.
    Error,
}

/// Knobs for the extraction engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub unsupported: UnsupportedPolicy,
    pub parent_dir_mode: u32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            unsupported: UnsupportedPolicy::Skip,
            parent_dir_mode: DEFAULT_PARENT_DIR_MODE,
        }
    }
}

/// Counts of what an extraction did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub directories: usize,
    pub files: usize,
    pub symlinks: usize,
    pub skipped: usize,
    pub bytes: u64,
}

/// Extracts every entry of `archive` into `dest_dir`, which must already exist.
pub fn extract_archive<R: Read>(
    archive: &mut tar::Archive<R>,
    dest_dir: &Path,
    options: &ExtractOptions,
) -> ArchiveResult<ExtractSummary> {
    let mut summary = ExtractSummary::default();
    let mut pending = PendingModes::default();

    let entries = archive
        .entries()
        .map_err(|e| ArchiveError::decode("opening entry stream", e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| ArchiveError::decode("reading entry header", e))?;
        if ArchiveEntry::is_metadata_record(entry.header().entry_type()) {
            debug!("Skipping pax metadata record");
            continue;
        }
        let record = ArchiveEntry::from_tar(&entry)?;

        let Some(relative) = normalize_entry_name(&record.name)? else {
            debug!("Skipping root entry {:?}", record.name);
            continue;
        };
        ensure_no_symlink_ancestors(dest_dir, &relative)?;
        let target = dest_dir.join(&relative);

        match &record.kind {
            EntryKind::Directory => {
                materialize_dir(&target, record.mode, dest_dir, &mut pending)?;
                summary.directories += 1;
            }
            EntryKind::RegularFile { size } => {
                ensure_parent(&target, options.parent_dir_mode, dest_dir, &mut pending)?;
                fsio::remove_non_dir(&target)?;
                let written = fsio::write_file_from_reader(&target, &mut entry, record.mode)?;
                if written != *size {
                    return Err(ArchiveError::decode(
                        format!("content of {}", record.name.display()),
                        std::io::Error::new(
                            std::io::ErrorKind::UnexpectedEof,
                            format!("expected {size} bytes, got {written}"),
                        ),
                    ));
                }
                fsio::set_mode(&target, record.mode)?;
                debug!("Wrote {:?} ({} bytes)", target, written);
                summary.files += 1;
                summary.bytes += written;
            }
            EntryKind::Symlink { target: link_target } => {
                ensure_parent(&target, options.parent_dir_mode, dest_dir, &mut pending)?;
                links::create_symlink(link_target, &target)?;
                links::restore_symlink_mode(&target, record.mode);
                summary.symlinks += 1;
            }
            EntryKind::Other(kind) => match options.unsupported {
                UnsupportedPolicy::Skip => {
                    warn!("Skipping unsupported entry {:?} ({})", record.name, kind);
                    summary.skipped += 1;
                }
                UnsupportedPolicy::Error => {
                    return Err(ArchiveError::Unsupported {
                        entry: record.name.clone(),
                        kind: kind.to_string(),
                    })
                }
            },
        }
    }

    pending.apply()?;

    info!(
        "Extracted {} dirs, {} files, {} symlinks into {:?} ({} skipped)",
        summary.directories, summary.files, summary.symlinks, dest_dir, summary.skipped
    );
    Ok(summary)
}

/// Directory modes to put in place once every entry is on disk.
#[derive(Debug, Default)]
struct PendingModes {
    modes: HashMap<PathBuf, u32>,
}

impl PendingModes {
    /// Gives the owner write and search access to an existing directory,
    /// queueing its current mode for restoration unless one is already queued.
    fn unlock(&mut self, dir: &Path) -> ArchiveResult<()> {
        if let Some(previous) = fsio::grant_owner_access(dir)? {
            self.modes.entry(dir.to_path_buf()).or_insert(previous);
        }
        Ok(())
    }

    /// Queues the mode recorded in the archive, replacing anything queued earlier.
    fn defer(&mut self, dir: PathBuf, mode: u32) {
        self.modes.insert(dir, mode);
    }

    fn apply(self) -> ArchiveResult<()> {
        let mut modes: Vec<_> = self.modes.into_iter().collect();
        // Deepest first, so tightening a parent can't block fixing a child.
        modes.sort_by_key(|(dir, _)| Reverse(dir.components().count()));
        for (dir, mode) in &modes {
            fsio::set_mode(dir, *mode)?;
        }
        Ok(())
    }
}

/// Creates (or reuses) the directory for a directory entry and queues its mode.
fn materialize_dir(
    path: &Path,
    mode: u32,
    dest_dir: &Path,
    pending: &mut PendingModes,
) -> ArchiveResult<()> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => pending.unlock(path)?,
        Ok(_) => {
            return Err(ArchiveError::NotADirectory {
                path: path.to_path_buf(),
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            unlock_nearest_ancestor(path, dest_dir, pending)?;
            // Owner rwx until the deferred chmod, so contents can still be written.
            fsio::create_dir_all_with_mode(path, mode | 0o700)?;
        }
        Err(e) => return Err(ArchiveError::io(path, e)),
    }
    pending.defer(path.to_path_buf(), mode);
    Ok(())
}

/// Makes sure the directory holding `path` exists and accepts new children.
fn ensure_parent(
    path: &Path,
    mode: u32,
    dest_dir: &Path,
    pending: &mut PendingModes,
) -> ArchiveResult<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    unlock_nearest_ancestor(path, dest_dir, pending)?;
    if !probe::exists(parent) {
        fsio::create_dir_all_with_mode(parent, mode)?;
    }
    Ok(())
}

/// Unlocks the closest existing directory above `path` that lies inside `dest_dir`.
fn unlock_nearest_ancestor(
    path: &Path,
    dest_dir: &Path,
    pending: &mut PendingModes,
) -> ArchiveResult<()> {
    let nearest = path.ancestors().skip(1).find(|dir| probe::exists(dir));
    match nearest {
        Some(dir) if dir.starts_with(dest_dir) => pending.unlock(dir),
        _ => Ok(()),
    }
}
