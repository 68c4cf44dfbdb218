//! # Packrat Filesystem Link Operations
//!
//! File: cli/src/common/fs/links.rs
//!
//! ## Overview
//!
//! Cross-platform helpers for reading and recreating symbolic links. The archive
//! writer reads link targets verbatim (without resolving them), and the
//! extraction engine recreates links from the recorded target text.
//!
//! ## Architecture
//!
//! - **`read_link_target`**: Reads the target text of a link, never following it.
//! - **`create_symlink`**: Creates `link -> target`. It never backs up or
//!   replaces an existing object: anything already at `link` (a file, a
//!   directory or another link) is an `AlreadyExists` error, so re-extracting
//!   an archive that contains links is not idempotent.
//! - **`restore_symlink_mode`**: Best-effort and never fatal. The standard
//!   library's chmod follows links, which would change the referent instead of
//!   the link, so the link keeps its platform default mode.
//!
//! On Windows the link flavour (file or directory) is chosen from what the
//! target resolves to at creation time; dangling targets become file links.
//!
use crate::core::error::{ArchiveError, ArchiveResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Reads the target text of the symbolic link at `link`.
pub fn read_link_target(link: &Path) -> ArchiveResult<PathBuf> {
    fs::read_link(link).map_err(|e| ArchiveError::io(link, e))
}

/// Creates a symbolic link at `link` pointing to `target`.
///
/// `target` is stored as given; relative targets are resolved by the OS
/// relative to the link's parent directory when the link is followed.
///
/// # Errors
///
/// - `AlreadyExists` if any object (including a dangling link) is at `link`.
/// - `Io` if link creation fails for another reason.
pub fn create_symlink(target: &Path, link: &Path) -> ArchiveResult<()> {
    // symlink_metadata doesn't follow, so dangling links count as present.
    if link.symlink_metadata().is_ok() {
        return Err(ArchiveError::AlreadyExists {
            path: link.to_path_buf(),
        });
    }

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).map_err(|e| ArchiveError::io(link, e))?;
    }
    #[cfg(windows)]
    {
        let resolved = link.parent().unwrap_or_else(|| Path::new(".")).join(target);
        if resolved.is_dir() {
            std::os::windows::fs::symlink_dir(target, link)
                .map_err(|e| ArchiveError::io(link, e))?;
        } else {
            std::os::windows::fs::symlink_file(target, link)
                .map_err(|e| ArchiveError::io(link, e))?;
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        return Err(ArchiveError::Unsupported {
            entry: link.to_path_buf(),
            kind: "symbolic link".into(),
        });
    }

    debug!("Created symlink: {:?} -> {:?}", link, target);
    Ok(())
}

/// Attempts to give the link at `link` the permission bits of `mode`.
///
/// There is no portable no-follow chmod in std, so the link's own mode is left
/// as the platform creates it (0777 on Linux, where it is ignored anyway).
pub fn restore_symlink_mode(link: &Path, mode: u32) {
    trace!(
        "Leaving mode of symlink {:?} at platform default (recorded {:o})",
        link,
        mode & 0o7777
    );
}

// --- Unit Tests ---
#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_symlink_basic() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let link = dir.path().join("target.link");
        create_symlink(Path::new("source.txt"), &link)?;
        assert!(link.is_symlink(), "Target should be a symlink");
        assert_eq!(read_link_target(&link)?, PathBuf::from("source.txt"));
        Ok(())
    }

    #[test]
    fn test_create_symlink_dangling_target_is_allowed() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let link = dir.path().join("dangling");
        create_symlink(Path::new("does/not/exist"), &link)?;
        assert!(link.is_symlink());
        assert!(!link.exists());
        Ok(())
    }

    #[test]
    fn test_create_symlink_existing_object_fails() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let occupied = dir.path().join("occupied");
        fs::write(&occupied, "original")?;
        let result = create_symlink(Path::new("elsewhere"), &occupied);
        assert!(matches!(result, Err(ArchiveError::AlreadyExists { .. })));
        // The existing file is left untouched.
        assert_eq!(fs::read_to_string(&occupied)?, "original");
        Ok(())
    }

    #[test]
    fn test_create_symlink_twice_fails() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let link = dir.path().join("again");
        create_symlink(Path::new("t"), &link)?;
        let result = create_symlink(Path::new("t"), &link);
        assert!(matches!(result, Err(ArchiveError::AlreadyExists { .. })));
        Ok(())
    }

    #[test]
    fn test_read_link_target_on_regular_file_fails() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("plain");
        fs::write(&file, "")?;
        assert!(read_link_target(&file).is_err());
        Ok(())
    }
}
