//! Entry name validation for extraction.
//!
//! Every entry name is normalized before it touches the filesystem: `.`
//! components are dropped, inner `..` components are resolved lexically, and
//! anything absolute or escaping the root is rejected with `PathEscape`.
//! `ensure_no_symlink_ancestors` then refuses to materialize an entry beneath a
//! symlink that already sits inside the destination.

use crate::core::error::{ArchiveError, ArchiveResult};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Normalizes an archive entry name into a path relative to the destination.
///
/// Returns `Ok(None)` for names that denote the root itself (`.`, `./`).
pub fn normalize_entry_name(name: &Path) -> ArchiveResult<Option<PathBuf>> {
    let mut normalized = PathBuf::new();
    for component in name.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                return Err(ArchiveError::PathEscape {
                    entry: name.to_path_buf(),
                })
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(ArchiveError::PathEscape {
                        entry: name.to_path_buf(),
                    });
                }
            }
            Component::Normal(part) => normalized.push(part),
        }
    }

    if normalized.as_os_str().is_empty() {
        Ok(None)
    } else {
        Ok(Some(normalized))
    }
}

/// Fails with `PathEscape` if any existing ancestor of `dest/relative`
/// (strictly below `dest`) is a symbolic link.
pub fn ensure_no_symlink_ancestors(dest: &Path, relative: &Path) -> ArchiveResult<()> {
    let Some(parent) = relative.parent() else {
        return Ok(());
    };

    let mut current = dest.to_path_buf();
    for component in parent.components() {
        current.push(component);
        match current.symlink_metadata() {
            Ok(metadata) if metadata.file_type().is_symlink() => {
                return Err(ArchiveError::PathEscape {
                    entry: relative.to_path_buf(),
                })
            }
            Ok(_) => {}
            // Nothing deeper can exist yet.
            Err(e) if e.kind() == io::ErrorKind::NotFound => break,
            Err(e) => return Err(ArchiveError::io(&current, e)),
        }
    }
    Ok(())
}
