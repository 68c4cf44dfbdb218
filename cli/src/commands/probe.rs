//! # Packrat Probe Handler
//!
//! File: cli/src/commands/probe.rs
//!
//! Implements `packrat probe`, a thin front-end over `common::fs::probe`.
//! Prints whether the path exists and, if it does, its size, whether it is a
//! symlink or a directory, and its modification time. `--files` instead prints
//! every non-directory entry below the path, one absolute path per line.
//!
//! ```bash
//! packrat probe ./backup.tar.gz
//! packrat probe --files ./project
//! ```
//!
use clap::Parser;
use packrat::common::fs::probe;
use packrat::core::error::{ArchiveError, ArchiveResult, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Report filesystem facts about a path")]
pub struct ProbeArgs {
    /// Path to inspect.
    path: PathBuf,

    /// List every non-directory entry below the path instead.
    #[arg(long)]
    files: bool,
}

pub async fn handle_probe(args: ProbeArgs) -> Result<()> {
    info!("Probing {:?} (files: {})", args.path, args.files);
    let path = args.path.as_path();

    if args.files {
        for file in probe::list_files_recursive(path)? {
            println!("{}", file.display());
        }
        return Ok(());
    }

    let exists = probe::exists(path);
    // A dangling symlink doesn't "exist" but is still a link.
    let is_symlink = symlink_status(path)?;
    println!("path:      {}", path.display());
    println!("exists:    {}", exists);
    println!("symlink:   {}", is_symlink);
    if exists {
        println!("directory: {}", probe::is_dir(path));
        println!("size:      {}", probe::size(path)?);
        println!(
            "modified:  {}",
            probe::modify_time(path)?.format("%Y-%m-%d %H:%M:%S %z")
        );
    }
    Ok(())
}

/// `probe::is_symlink`, except that a path that isn't there is simply not a link.
/// Any other stat failure is reported.
fn symlink_status(path: &Path) -> ArchiveResult<bool> {
    match probe::is_symlink(path) {
        Err(ArchiveError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => Ok(false),
        other => other,
    }
}
