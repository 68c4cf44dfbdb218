//! # Packrat Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types used throughout Packrat. There are two
//! layers, mirroring how the crate is split:
//!
//! - `ArchiveError`: a `thiserror` enum returned by every archive and probe
//!   operation (`ArchiveResult<T>`). Callers match on its variants to tell a
//!   missing archive from a corrupt one, a symlink conflict from a permission
//!   problem, and so on.
//! - `AppError` + `Result<T>`: the application layer (configuration loading,
//!   command handlers) uses `anyhow::Result<T>` for context-rich propagation,
//!   with `AppError` for the few failures it raises itself.
//!
//! ## Examples
//!
//! ```rust
//! use packrat::common::archive::unpack_gzip;
//! use packrat::core::error::ArchiveError;
//! use std::path::Path;
//!
//! match unpack_gzip(Path::new("bundle.tar.gz"), Path::new("out")) {
//!     Ok(()) => println!("unpacked"),
//!     Err(ArchiveError::NotFound { path }) => eprintln!("no archive at {}", path.display()),
//!     Err(ArchiveError::Decode { .. }) => eprintln!("archive is corrupt"),
//!     Err(e) => eprintln!("unpack failed: {e}"),
//! }
//! ```
//!
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by the archive subsystem and the filesystem probe.
// No PartialEq: the io::Error sources don't implement it.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// An archive, base directory or input path is missing.
    #[error("Path not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// A path that must be a directory exists as something else.
    #[error("Path exists but is not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    /// The destination already holds an object the operation won't replace.
    #[error("Destination already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    /// The container or its compression framing is malformed or truncated.
    #[error("Failed to decode archive ({context}): {source}")]
    Decode {
        context: String,
        #[source]
        source: io::Error,
    },

    /// An underlying read, write, stat or chmod failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An entry name or pack input would resolve outside its root directory.
    #[error("Refusing path outside the archive root: {}", entry.display())]
    PathEscape { entry: PathBuf },

    /// The entry kind (device, FIFO, socket, hard link) can't be materialized.
    #[error("Unsupported entry '{}' of kind {kind}", entry.display())]
    Unsupported { entry: PathBuf, kind: String },
}

impl ArchiveError {
    /// Wraps an I/O failure on `path`, turning `NotFound`/`AlreadyExists`
    /// into their dedicated variants.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => ArchiveError::NotFound { path },
            io::ErrorKind::AlreadyExists => ArchiveError::AlreadyExists { path },
            _ => ArchiveError::Io { path, source },
        }
    }

    pub fn decode(context: impl Into<String>, source: io::Error) -> Self {
        ArchiveError::Decode {
            context: context.into(),
            source,
        }
    }
}

/// Result type for archive and probe operations.
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;

/// Errors raised by the application layer itself.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Type alias for Result using anyhow::Error for the application layer.
/// Anyhow allows for easy context addition and flexible error handling.
pub type Result<T> = anyhow::Result<T>;

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let config_err = AppError::Config("Missing setting 'foo'".to_string());
        assert_eq!(
            config_err.to_string(),
            "Configuration error: Missing setting 'foo'"
        );

        let not_dir = ArchiveError::NotADirectory {
            path: PathBuf::from("/tmp/out"),
        };
        assert_eq!(
            not_dir.to_string(),
            "Path exists but is not a directory: /tmp/out"
        );

        let unsupported = ArchiveError::Unsupported {
            entry: PathBuf::from("dev/null"),
            kind: "character device".into(),
        };
        assert_eq!(
            unsupported.to_string(),
            "Unsupported entry 'dev/null' of kind character device"
        );
    }

    #[test]
    fn test_io_maps_error_kinds() {
        let err = ArchiveError::io("a", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, ArchiveError::NotFound { .. }));

        let err = ArchiveError::io("b", io::Error::from(io::ErrorKind::AlreadyExists));
        assert!(matches!(err, ArchiveError::AlreadyExists { .. }));

        let err = ArchiveError::io("c", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, ArchiveError::Io { .. }));
    }
}
