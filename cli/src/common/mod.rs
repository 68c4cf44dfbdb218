//! # Packrat Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! Shared building blocks used by the command handlers:
//!
//! - **`archive`**: Packing and unpacking tar archives (plain, gzip, bzip2),
//!   the entry model and the extraction engine.
//! - **`fs`**: Filesystem probes (existence, size, link/dir checks, modify
//!   time, recursive listing) and the primitive mutations extraction needs.
//!
//! ```rust
//! use packrat::common::{archive, fs};
//! use std::path::Path;
//!
//! # fn run() -> packrat::core::error::ArchiveResult<()> {
//! if fs::probe::exists(Path::new("backup.tar.gz")) {
//!     archive::unpack_gzip(Path::new("backup.tar.gz"), Path::new("restore"))?;
//! }
//! # Ok(())
//! # }
//! ```
//!

/// Tar archive creation and extraction.
pub mod archive;
/// Filesystem probes and primitive mutations.
pub mod fs;
