//! # Packrat Archive Module (`common::archive`)
//!
//! File: cli/src/common/archive/mod.rs
//!
//! ## Overview
//!
//! Packing a directory subtree into a tar archive and unpacking one back onto
//! disk, with optional gzip or bzip2 framing. Regular files, directories and
//! symbolic links round-trip with their relative names, permission bits and
//! link targets.
//!
//! ## Architecture
//!
//! - **`entry`**: The `ArchiveEntry` record, its tagged `EntryKind`, and the
//!   `PackRequest` / `UnpackRequest` inputs.
//! - **`compression`**: The `Compression` codec selector, name- and
//!   magic-based detection, and the reader/writer filters for each codec.
//! - **`pack`**: The archive writer (walks inputs, emits headers and content).
//! - **`extract`**: The extraction engine shared by every reader.
//! - **`unpack`**: Reader front-ends (`unpack_plain`, `unpack_gzip`,
//!   `unpack_bzip2`, `unpack`) and `list_entries`.
//! - `sanitize` (private): entry name normalization and escape checks.
//!
//! ## Usage
//!
//! ```rust
//! use packrat::common::archive::{self, Compression, PackRequest};
//! use std::path::Path;
//!
//! # fn run() -> packrat::core::error::ArchiveResult<()> {
//! archive::pack(
//!     &PackRequest::new("/srv/app", ["config", "data"], "/tmp/app.tar.bz2")
//!         .with_compression(Compression::Bzip2),
//! )?;
//! archive::unpack_bzip2(Path::new("/tmp/app.tar.bz2"), Path::new("/tmp/restore"))?;
//! # Ok(())
//! # }
//! ```
//!
pub mod compression;
pub mod entry;
pub mod extract;
pub mod pack;
mod sanitize;
pub mod unpack;

pub use compression::Compression;
pub use entry::{ArchiveEntry, EntryKind, OtherKind, PackRequest, UnpackRequest};
pub use extract::{ExtractOptions, ExtractSummary, UnsupportedPolicy};
pub use pack::pack;
pub use unpack::{list_entries, unpack, unpack_bzip2, unpack_gzip, unpack_plain, unpack_with_options};
