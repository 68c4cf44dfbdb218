//! # Packrat Archive Reader Front-Ends (`common::archive::unpack`)
//!
//! File: cli/src/common/archive/unpack.rs
//!
//! ## Overview
//!
//! Entry points that open an archive file, layer the matching decompression
//! filter over it, and drive the extraction engine. `unpack_plain`,
//! `unpack_gzip` and `unpack_bzip2` differ only in that filter; `unpack` and
//! `unpack_with_options` take the codec from an `UnpackRequest`.
//!
//! Every front-end:
//! 1. fails with `NotFound` if the archive doesn't exist,
//! 2. fails with `NotADirectory` if the destination exists as something else,
//!    and creates it (with parents) if it's missing,
//! 3. decodes and extracts entries in stream order.
//!
//! A corrupt compressed stream surfaces as `Decode` on the first header read,
//! before any regular file is written.
//!
//! `list_entries` reuses the same decoding path to report an archive's
//! contents without touching the filesystem.
//!
use super::compression::Compression;
use super::entry::{ArchiveEntry, UnpackRequest};
use super::extract::{extract_archive, ExtractOptions, ExtractSummary};
use crate::common::fs::{io as fsio, probe};
use crate::core::error::{ArchiveError, ArchiveResult};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

/// Extracts an uncompressed tar archive into `dest_dir`.
pub fn unpack_plain(archive_path: &Path, dest_dir: &Path) -> ArchiveResult<()> {
    unpack(&UnpackRequest::new(archive_path, dest_dir, Compression::None))
}

/// Extracts a gzip-compressed tar archive into `dest_dir`.
pub fn unpack_gzip(archive_path: &Path, dest_dir: &Path) -> ArchiveResult<()> {
    unpack(&UnpackRequest::new(archive_path, dest_dir, Compression::Gzip))
}

/// Extracts a bzip2-compressed tar archive into `dest_dir`.
pub fn unpack_bzip2(archive_path: &Path, dest_dir: &Path) -> ArchiveResult<()> {
    unpack(&UnpackRequest::new(archive_path, dest_dir, Compression::Bzip2))
}

/// Extracts `request.archive_path` with default options.
pub fn unpack(request: &UnpackRequest) -> ArchiveResult<()> {
    unpack_with_options(request, &ExtractOptions::default()).map(|_| ())
}

/// Extracts `request.archive_path` and reports what was materialized.
pub fn unpack_with_options(
    request: &UnpackRequest,
    options: &ExtractOptions,
) -> ArchiveResult<ExtractSummary> {
    let archive_path = request.archive_path.as_path();
    let dest_dir = request.dest_dir.as_path();
    info!(
        "Unpacking {:?} ({}) into {:?}",
        archive_path, request.compression, dest_dir
    );

    let reader = open_decoded(archive_path, request.compression)?;
    fsio::ensure_dir_exists(dest_dir)?;

    let mut archive = tar::Archive::new(reader);
    extract_archive(&mut archive, dest_dir, options)
}

/// Decodes the headers of every entry without extracting anything.
pub fn list_entries(
    archive_path: &Path,
    compression: Compression,
) -> ArchiveResult<Vec<ArchiveEntry>> {
    let mut archive = tar::Archive::new(open_decoded(archive_path, compression)?);
    let entries = archive
        .entries()
        .map_err(|e| ArchiveError::decode("opening entry stream", e))?;

    let mut listed = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ArchiveError::decode("reading entry header", e))?;
        if ArchiveEntry::is_metadata_record(entry.header().entry_type()) {
            continue;
        }
        listed.push(ArchiveEntry::from_tar(&entry)?);
    }
    Ok(listed)
}

/// Opens `archive_path` and layers the decompression filter for `compression`.
fn open_decoded(archive_path: &Path, compression: Compression) -> ArchiveResult<Box<dyn Read>> {
    if !probe::exists(archive_path) {
        return Err(ArchiveError::NotFound {
            path: archive_path.to_path_buf(),
        });
    }
    let file = File::open(archive_path).map_err(|e| ArchiveError::io(archive_path, e))?;
    Ok(compression.wrap_reader(BufReader::new(file)))
}
