//! # Packrat Unpack Handler
//!
//! File: cli/src/commands/unpack.rs
//!
//! ## Overview
//!
//! Implements `packrat unpack`, which extracts a tar archive into a destination
//! directory, creating it if needed. Without `--compression` (or with
//! `--compression auto`) the codec is detected from the archive's magic bytes,
//! then its file name.
//!
//! The destination defaults to the configured `unpack.default_destination`, or
//! the current directory. `--strict` turns unsupported entries (devices, FIFOs,
//! hard links) into errors instead of skipping them.
//!
//! ## Usage
//!
//! ```bash
//! packrat unpack backup.tar.gz /tmp/restore
//! packrat unpack --compression bzip2 --strict data.bin ./out
//! ```
//!
use super::run_interruptible;
use anyhow::Context;
use clap::{Parser, ValueEnum};
use packrat::common::archive::{self, Compression, UnpackRequest, UnsupportedPolicy};
use packrat::core::config;
use packrat::core::error::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// Codec selection on the command line; `Auto` inspects the archive.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CompressionArg {
    #[default]
    Auto,
    None,
    Gzip,
    Bzip2,
}

impl CompressionArg {
    /// Resolves to a concrete codec, reading the archive prefix for `Auto`.
    pub fn resolve(self, archive_path: &Path) -> Result<Compression> {
        Ok(match self {
            CompressionArg::Auto => Compression::detect(archive_path)?,
            CompressionArg::None => Compression::None,
            CompressionArg::Gzip => Compression::Gzip,
            CompressionArg::Bzip2 => Compression::Bzip2,
        })
    }
}

#[derive(Parser, Debug)]
#[command(about = "Unpack a tar archive into a directory")]
pub struct UnpackArgs {
    /// Archive to extract.
    archive: PathBuf,

    /// Destination directory (created if missing).
    dest: Option<PathBuf>,

    /// Compression codec of the archive.
    #[arg(long, value_enum, default_value_t = CompressionArg::Auto)]
    compression: CompressionArg,

    /// Fail on entries that can't be materialized instead of skipping them.
    #[arg(long)]
    strict: bool,
}

pub async fn handle_unpack(args: UnpackArgs) -> Result<()> {
    let cfg = config::load_config().context("Failed to load configuration")?;
    let compression = args.compression.resolve(&args.archive)?;
    let dest = args
        .dest
        .or_else(|| cfg.unpack.default_destination.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    let mut options = cfg.unpack.extract_options();
    if args.strict {
        options.unsupported = UnsupportedPolicy::Error;
    }

    let request = UnpackRequest::new(&args.archive, &dest, compression);
    info!("Handling unpack command: {:?} ({:?})", request, options);

    let summary =
        run_interruptible("unpack", move || archive::unpack_with_options(&request, &options))
            .await?;
    println!(
        "Unpacked {} into {}: {} directories, {} files, {} symlinks ({} bytes)",
        args.archive.display(),
        dest.display(),
        summary.directories,
        summary.files,
        summary.symlinks,
        summary.bytes
    );
    if summary.skipped > 0 {
        println!("Skipped {} unsupported entries", summary.skipped);
    }
    Ok(())
}
