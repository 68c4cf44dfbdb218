//! # Packrat Filesystem Probe
//!
//! File: cli/src/common/fs/probe.rs
//!
//! ## Overview
//!
//! Stateless queries over paths: existence, size, symlink-ness, directory-ness,
//! modify time and recursive file enumeration. Nothing here mutates the
//! filesystem. The archive writer uses these to validate its inputs, and
//! external callers use them to check paths before handing them to pack/unpack.
//!
//! Two of the queries (`exists`, `is_dir`) are deliberately "safe probes": any
//! stat failure simply yields `false`. Callers that need to know *why* a path
//! is unusable must stat it themselves.
//!
//! ## Usage
//!
//! ```rust
//! use packrat::common::fs::probe;
//! use std::path::Path;
//!
//! # fn run() -> packrat::core::error::ArchiveResult<()> {
//! let dir = Path::new("./assets");
//! if probe::is_dir(dir) {
//!     for file in probe::list_files_recursive(dir)? {
//!         println!("{} ({} bytes)", file.display(), probe::size(&file)?);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
use crate::core::error::{ArchiveError, ArchiveResult};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Returns `true` if `path` resolves to any filesystem object.
///
/// Symlinks are followed, so a dangling link reports `false`. Any stat
/// failure (not only "not found") yields `false`.
pub fn exists(path: &Path) -> bool {
    fs::metadata(path).is_ok()
}

/// Returns the byte length of the object at `path`.
///
/// # Errors
///
/// `NotFound` if `exists(path)` is false, `Io` if the stat itself fails.
pub fn size(path: &Path) -> ArchiveResult<u64> {
    if !exists(path) {
        return Err(ArchiveError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let metadata = fs::metadata(path).map_err(|e| ArchiveError::io(path, e))?;
    Ok(metadata.len())
}

/// Returns whether `path` itself is a symbolic link (the link is not followed).
///
/// # Errors
///
/// `Io` carrying the underlying cause if the path can't be inspected at all,
/// including when it does not exist.
pub fn is_symlink(path: &Path) -> ArchiveResult<bool> {
    let metadata = fs::symlink_metadata(path).map_err(|source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(metadata.file_type().is_symlink())
}

/// Returns `true` if `path` resolves to a directory. Stat failures yield `false`.
pub fn is_dir(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

/// Returns the last modification time of the object at `path`.
pub fn modify_time(path: &Path) -> ArchiveResult<DateTime<Local>> {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(DateTime::<Local>::from(modified))
}

/// Walks `dir` and returns the absolute path of every non-directory entry.
///
/// Symlinks are reported as-is rather than followed. The order is the
/// filesystem's traversal order and is not guaranteed to be stable.
///
/// # Errors
///
/// `NotFound` if `dir` does not exist; `Io` if the walk hits an unreadable
/// directory.
pub fn list_files_recursive(dir: &Path) -> ArchiveResult<Vec<PathBuf>> {
    if !exists(dir) {
        return Err(ArchiveError::NotFound {
            path: dir.to_path_buf(),
        });
    }
    // Walking from an absolute root makes every yielded path absolute.
    let root = std::path::absolute(dir).map_err(|e| ArchiveError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).follow_links(false) {
        let entry = entry.map_err(|e| walk_error(&root, e))?;
        if entry.file_type().is_dir() {
            continue;
        }
        files.push(entry.into_path());
    }
    debug!("Found {} files under {:?}", files.len(), root);
    Ok(files)
}

/// Converts a `walkdir` failure into an `ArchiveError` on the offending path.
pub(crate) fn walk_error(root: &Path, err: walkdir::Error) -> ArchiveError {
    let path = err.path().unwrap_or(root).to_path_buf();
    match err.into_io_error() {
        Some(source) => ArchiveError::io(path, source),
        None => ArchiveError::Io {
            path,
            source: std::io::Error::other("filesystem loop detected"),
        },
    }
}
