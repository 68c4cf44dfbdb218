//! # Packrat Filesystem I/O Operations
//!
//! File: cli/src/common/fs/io.rs
//!
//! ## Overview
//!
//! This module centralizes the filesystem mutations the extraction engine and
//! the reader front-ends need: making sure a destination directory exists,
//! creating directory chains with a given mode, writing a file from a stream
//! with a given mode, and applying permission bits.
//!
//! ## Architecture
//!
//! - **`ensure_dir_exists`**: Creates a directory (and parents) if missing. If the
//!   path exists it must be a directory, otherwise `NotADirectory` is returned.
//! - **`create_dir_all_with_mode`**: `mkdir -p` where every newly created component
//!   gets the requested mode (subject to the process umask on Unix).
//! - **`write_file_from_reader`**: Truncates or creates a file and streams content
//!   into it. Read failures are reported as decode errors because the reader is
//!   always an archive entry; write failures are I/O errors on the destination.
//! - **`set_mode`**: Applies permission bits on Unix; a no-op elsewhere.
//! - **`grant_owner_access`** / **`remove_non_dir`**: Let a later extraction
//!   write into read-only directories and replace read-only files.
//!
//! All functions return `ArchiveResult` so callers can match on the failure kind.
//!
use crate::core::error::{ArchiveError, ArchiveResult};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Mode used when creating an unpack destination that doesn't exist yet.
pub const DEFAULT_DEST_MODE: u32 = 0o755;

/// Ensures that a directory exists at the specified path.
///
/// If the path does not exist, the directory and any missing parents are
/// created (similar to `mkdir -p`). If the path already exists but is not a
/// directory, `ArchiveError::NotADirectory` is returned.
pub fn ensure_dir_exists(path: &Path) -> ArchiveResult<()> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => {
            debug!("Directory already exists: {:?}", path);
            Ok(())
        }
        Ok(_) => Err(ArchiveError::NotADirectory {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            create_dir_all_with_mode(path, DEFAULT_DEST_MODE)?;
            info!("Created directory: {:?}", path);
            Ok(())
        }
        Err(e) => Err(ArchiveError::io(path, e)),
    }
}

/// Creates `path` and all missing ancestors, each with `mode`.
///
/// Succeeds if the directory already exists.
pub fn create_dir_all_with_mode(path: &Path, mode: u32) -> ArchiveResult<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode & 0o7777);
    }
    #[cfg(not(unix))]
    let _ = mode;

    builder.create(path).map_err(|e| match e.kind() {
        // DirBuilder reports a file sitting where a directory should be as AlreadyExists.
        io::ErrorKind::AlreadyExists => ArchiveError::NotADirectory {
            path: path.to_path_buf(),
        },
        _ => ArchiveError::io(path, e),
    })
}

/// Creates (or truncates) the file at `path` and copies `content` into it.
///
/// Returns the number of bytes written. The final mode is *not* applied here;
/// call `set_mode` afterwards so pre-existing files pick it up too.
pub fn write_file_from_reader<R: Read>(
    path: &Path,
    content: &mut R,
    mode: u32,
) -> ArchiveResult<u64> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode & 0o7777);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut file: File = options.open(path).map_err(|e| ArchiveError::io(path, e))?;

    // Manual copy loop so read-side (archive) and write-side (destination)
    // failures map to different error kinds.
    let mut buf = [0u8; 64 * 1024];
    let mut written = 0u64;
    loop {
        let n = match content.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(ArchiveError::decode(
                    format!("reading content for {}", path.display()),
                    e,
                ))
            }
        };
        file.write_all(&buf[..n])
            .map_err(|e| ArchiveError::io(path, e))?;
        written += n as u64;
    }
    file.flush().map_err(|e| ArchiveError::io(path, e))?;
    Ok(written)
}

/// Applies the permission bits of `mode` to `path` (follows symlinks).
pub fn set_mode(path: &Path, mode: u32) -> ArchiveResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
            .map_err(|e| ArchiveError::io(path, e))?;
    }
    #[cfg(not(unix))]
    let _ = (path, mode);
    Ok(())
}

/// Makes the directory at `path` writable and searchable by its owner.
///
/// Returns the previous permission bits if they had to be widened, so the
/// caller can put them back later; `None` if nothing changed or `path` is not
/// a directory.
pub fn grant_owner_access(path: &Path) -> ArchiveResult<Option<u32>> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = fs::metadata(path).map_err(|e| ArchiveError::io(path, e))?;
        let mode = metadata.permissions().mode() & 0o7777;
        if !metadata.is_dir() || mode & 0o300 == 0o300 {
            return Ok(None);
        }
        set_mode(path, mode | 0o700)?;
        debug!("Temporarily opened {:?} (was {:o})", path, mode);
        Ok(Some(mode))
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(None)
    }
}

/// Removes a non-directory object at `path`, if any, without following links.
///
/// Used before writing a regular file so an existing read-only file or a
/// symlink is replaced rather than opened. Directories are left in place.
pub fn remove_non_dir(path: &Path) -> ArchiveResult<()> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => {
            debug!("Replacing existing {:?}", path);
            fs::remove_file(path).map_err(|e| ArchiveError::io(path, e))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ArchiveError::io(path, e)),
    }
}
