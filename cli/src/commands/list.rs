//! # Packrat List Handler
//!
//! File: cli/src/commands/list.rs
//!
//! Implements `packrat list`: decodes every header of an archive and prints one
//! line per entry (kind, mode, size, name and link target). Nothing is extracted.
//!
//! ```bash
//! packrat list backup.tar.gz
//! packrat list --compression none weird-name.bin
//! ```
//!
use super::run_interruptible;
use super::unpack::CompressionArg;
use clap::Parser;
use packrat::common::archive;
use packrat::core::error::Result;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "List the entries of a tar archive")]
pub struct ListArgs {
    /// Archive to inspect.
    archive: PathBuf,

    /// Compression codec of the archive.
    #[arg(long, value_enum, default_value_t = CompressionArg::Auto)]
    compression: CompressionArg,
}

pub async fn handle_list(args: ListArgs) -> Result<()> {
    let compression = args.compression.resolve(&args.archive)?;
    info!("Listing {:?} ({})", args.archive, compression);

    let archive_path = args.archive.clone();
    let entries =
        run_interruptible("list", move || archive::list_entries(&archive_path, compression))
            .await?;
    for entry in &entries {
        println!("{:<16} {}", entry.kind_label(), entry);
    }
    info!("{} entries", entries.len());
    Ok(())
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_args_parsing() {
        let args = ListArgs::try_parse_from(["list", "a.tgz"]).unwrap();
        assert_eq!(args.archive, PathBuf::from("a.tgz"));
        assert_eq!(args.compression, CompressionArg::Auto);

        let args = ListArgs::try_parse_from(["list", "--compression", "gzip", "a"]).unwrap();
        assert_eq!(args.compression, CompressionArg::Gzip);

        assert!(ListArgs::try_parse_from(["list"]).is_err());
    }
}
