//! # Packrat Archive Writer (`common::archive::pack`)
//!
//! File: cli/src/common/archive/pack.rs
//!
//! ## Overview
//!
//! Builds a tar archive (optionally gzip- or bzip2-framed) from a list of inputs
//! relative to a base directory. Every descendant of every input becomes one
//! entry carrying its relative name, mode, and (for symlinks) its link target.
//!
//! ## Architecture
//!
//! - Inputs are validated up front, before the output file is created: the base
//!   directory must exist and be a directory; each input must be relative, stay
//!   inside the base directory, and exist.
//! - Each input is walked with `walkdir` without following symlinks (the input
//!   itself first, then its children sorted by name).
//! - Entry names are computed from `base_dir` with `pathdiff`. The process
//!   working directory is never read or changed, so concurrent packs are safe.
//! - Each visited object is turned into an `ArchiveEntry` and then a GNU tar
//!   header filled from its metadata. Regular files are opened *before* their
//!   header is written so an unreadable file aborts without a dangling header.
//!   The body is held to the size in the header: growth is cut off, and a file
//!   that shrinks mid-read fails the pack with an `Io` error.
//! - The tar end marker is written, then the codec trailer.
//!
//! On failure the partially written archive is left on disk; cleaning up is the
//! caller's decision.
//!
//! ## Usage
//!
//! ```rust
//! use packrat::common::archive::{pack, Compression, PackRequest};
//!
//! # fn run() -> packrat::core::error::ArchiveResult<()> {
//! let request = PackRequest::new("./project", ["src", "Cargo.toml"], "/tmp/project.tar.gz")
//!     .with_compression(Compression::Gzip);
//! pack(&request)?;
//! # Ok(())
//! # }
//! ```
//!
use super::entry::{ArchiveEntry, EntryKind, OtherKind, PackRequest};
use super::sanitize::normalize_entry_name;
use crate::common::fs::{links, probe};
use crate::core::error::{ArchiveError, ArchiveResult};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Writes the archive described by `request`.
///
/// # Errors
///
/// - `NotFound` if `base_dir` or an input is missing.
/// - `NotADirectory` if `base_dir` is not a directory.
/// - `PathEscape` if an input is absolute or leaves `base_dir`.
/// - `Io` for any failure creating the output or reading/stating a source.
pub fn pack(request: &PackRequest) -> ArchiveResult<()> {
    let base_dir = request.base_dir.as_path();
    check_base_dir(base_dir)?;
    let roots = resolve_inputs(base_dir, &request.inputs)?;

    info!(
        "Packing {} input(s) from {:?} into {:?} ({})",
        roots.len(),
        base_dir,
        request.output_path,
        request.compression
    );

    let output = &request.output_path;
    let file = File::create(output).map_err(|e| ArchiveError::io(output, e))?;
    // Used to keep the archive from swallowing itself when it sits inside an input.
    let output_canonical = fs::canonicalize(output).ok();

    let encoder = request
        .compression
        .encoder(BufWriter::new(file), request.level);
    let mut builder = tar::Builder::new(encoder);

    let mut count = 0usize;
    for root in &roots {
        let walker = WalkDir::new(root)
            .follow_links(false)
            .follow_root_links(false)
            .sort_by_file_name();
        for dent in walker {
            let dent = dent.map_err(|e| probe::walk_error(root, e))?;
            let path = dent.path();
            let Some(name) = entry_name(base_dir, path) else {
                continue;
            };
            let metadata = dent.metadata().map_err(|e| probe::walk_error(path, e))?;

            if metadata.is_file() && is_output(path, output_canonical.as_deref()) {
                warn!("Skipping {:?}: it is the archive being written", path);
                continue;
            }

            if append_entry(&mut builder, path, name, &metadata)? {
                count += 1;
            }
        }
    }

    let encoder = builder
        .into_inner()
        .map_err(|e| ArchiveError::io(output, e))?;
    let mut writer = encoder.finish().map_err(|e| ArchiveError::io(output, e))?;
    writer.flush().map_err(|e| ArchiveError::io(output, e))?;

    info!("Wrote {} entries to {:?}", count, output);
    Ok(())
}

fn check_base_dir(base_dir: &Path) -> ArchiveResult<()> {
    let metadata = fs::metadata(base_dir).map_err(|e| ArchiveError::io(base_dir, e))?;
    if !metadata.is_dir() {
        return Err(ArchiveError::NotADirectory {
            path: base_dir.to_path_buf(),
        });
    }
    Ok(())
}

/// Joins each input onto `base_dir` after checking it stays inside and exists.
fn resolve_inputs(base_dir: &Path, inputs: &[PathBuf]) -> ArchiveResult<Vec<PathBuf>> {
    inputs
        .iter()
        .map(|input| {
            let root = match normalize_entry_name(input)? {
                Some(relative) => base_dir.join(relative),
                None => base_dir.to_path_buf(),
            };
            // Not following links: a dangling symlink is still a valid input.
            fs::symlink_metadata(&root).map_err(|e| ArchiveError::io(&root, e))?;
            Ok(root)
        })
        .collect()
}

/// Name of `path` relative to `base_dir`, or `None` for the base directory itself.
fn entry_name(base_dir: &Path, path: &Path) -> Option<PathBuf> {
    let relative = pathdiff::diff_paths(path, base_dir)?;
    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(relative)
    }
}

fn is_output(path: &Path, output: Option<&Path>) -> bool {
    match output {
        Some(output) => fs::canonicalize(path).is_ok_and(|p| p == output),
        None => false,
    }
}

/// Appends one filesystem object. Returns `false` if it was skipped.
fn append_entry<W: Write>(
    builder: &mut tar::Builder<W>,
    path: &Path,
    name: PathBuf,
    metadata: &fs::Metadata,
) -> ArchiveResult<bool> {
    let link_target = if metadata.file_type().is_symlink() {
        Some(links::read_link_target(path)?)
    } else {
        None
    };
    let entry = ArchiveEntry::from_metadata(name, metadata, link_target)?;

    let mut header = tar::Header::new_gnu();
    header.set_metadata_in_mode(metadata, tar::HeaderMode::Complete);
    entry.apply_to_header(&mut header);

    let result = match &entry.kind {
        EntryKind::RegularFile { size } => {
            let file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
            builder.append_data(&mut header, &entry.name, ExactSize::new(file, *size))
        }
        EntryKind::Directory => builder.append_data(&mut header, &entry.name, io::empty()),
        EntryKind::Symlink { target } => builder.append_link(&mut header, &entry.name, target),
        EntryKind::Other(OtherKind::Socket) => {
            warn!("Skipping socket {:?}: tar cannot represent sockets", path);
            return Ok(false);
        }
        EntryKind::Other(_) => builder.append_data(&mut header, &entry.name, io::empty()),
    };
    result.map_err(|e| ArchiveError::io(path, e))?;

    debug!("Added {}", entry);
    Ok(true)
}

/// Yields exactly `size` bytes of `inner`, the length already written into the
/// entry header. Extra bytes are cut off; running dry early is `UnexpectedEof`,
/// since `tar` would otherwise pad a short body and misalign the archive.
struct ExactSize<R> {
    inner: io::Take<R>,
    remaining: u64,
}

impl<R: Read> ExactSize<R> {
    fn new(inner: R, size: u64) -> Self {
        ExactSize {
            inner: inner.take(size),
            remaining: size,
        }
    }
}

impl<R: Read> Read for ExactSize<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && self.remaining > 0 && !buf.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("file shrank while packing: {} bytes missing", self.remaining),
            ));
        }
        self.remaining -= n as u64;
        Ok(n)
    }
}
