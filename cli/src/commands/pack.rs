//! # Packrat Pack Handler
//!
//! File: cli/src/commands/pack.rs
//!
//! ## Overview
//!
//! Implements `packrat pack`, which archives one or more inputs located below a
//! base directory. Entry names are relative to the base directory, so
//! `packrat pack -C /srv/app -o app.tar config` stores `config/...`.
//!
//! The codec is chosen, in order, from `--compression`, the configured
//! `pack.compression` (when not `none`), and the output file name
//! (`.tar.gz`, `.tgz`, `.tar.bz2`, ...). The level comes from configuration.
//!
//! ## Usage
//!
//! ```bash
//! packrat pack -C ./project -o /tmp/project.tar.gz src Cargo.toml
//! packrat pack -o backup.tar --compression bzip2 .   # explicit codec
//! ```
//!
use super::run_interruptible;
use anyhow::Context;
use clap::Parser;
use packrat::common::archive::{self, Compression, PackRequest};
use packrat::core::config::{self, PackConfig};
use packrat::core::error::Result;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Pack files and directories into a tar archive")]
pub struct PackArgs {
    /// Directory the inputs are relative to.
    #[arg(short = 'C', long = "base-dir", default_value = ".")]
    base_dir: PathBuf,

    /// Archive file to create (truncated if it exists).
    #[arg(short, long)]
    output: PathBuf,

    /// Compression codec: none, gzip or bzip2.
    #[arg(long, value_parser = clap::value_parser!(Compression))]
    compression: Option<Compression>,

    /// Inputs relative to the base directory; `.` packs its whole content.
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,
}

pub async fn handle_pack(args: PackArgs) -> Result<()> {
    let cfg = config::load_config().context("Failed to load configuration")?;
    let compression = choose_compression(args.compression, &cfg.pack, &args.output);
    let mut request = PackRequest::new(&args.base_dir, &args.inputs, &args.output)
        .with_compression(compression);
    if let Some(level) = cfg.pack.level_for(compression) {
        request = request.with_level(level);
    }
    info!("Handling pack command: {:?}", request);

    run_interruptible("pack", move || archive::pack(&request)).await?;
    println!("Packed {} ({})", args.output.display(), compression);
    Ok(())
}

fn choose_compression(flag: Option<Compression>, cfg: &PackConfig, output: &Path) -> Compression {
    flag.or(match cfg.compression {
        Compression::None => None,
        configured => Some(configured),
    })
    .or_else(|| Compression::from_path(output))
    .unwrap_or_default()
}
