//! # Packrat Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! This file serves as the main entry point for the `packrat` CLI.
//! It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to the command handlers
//!
//! The archive logic lives in the `packrat` library crate (`cli/src/lib.rs`);
//! the handlers in `commands` only translate arguments and configuration
//! into library calls.
//!
//! ## Examples
//!
//! ```bash
//! # Get help
//! packrat --help
//!
//! # Pack with increased verbosity
//! packrat -vv pack -C ./project -o project.tar.gz src
//!
//! # Unpack, detecting the codec
//! packrat unpack project.tar.gz /tmp/project
//! ```
//!
//! Command processing flow:
//! 1. Parse command-line args via Clap
//! 2. Configure logging based on verbosity level (or `RUST_LOG`)
//! 3. Route to the command handler
//! 4. Print any error as `Error: ...` and exit with status 1
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

/// Top-level command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "packrat",
    about = "Pack and unpack directory trees as tar archives",
    long_about = "Pack directory trees into tar archives (plain, gzip or bzip2) and unpack them again,\n\
                  preserving relative names, permission bits and symbolic links.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Parser, Debug)]
enum Commands {
    #[command(alias = "p")]
    Pack(commands::pack::PackArgs),
    #[command(alias = "x")]
    Unpack(commands::unpack::UnpackArgs),
    #[command(alias = "ls")]
    List(commands::list::ListArgs),
    Probe(commands::probe::ProbeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match cli.command {
        Commands::Pack(args) => commands::pack::handle_pack(args).await,
        Commands::Unpack(args) => commands::unpack::handle_unpack(args).await,
        Commands::List(args) => commands::list::handle_list(args).await,
        Commands::Probe(args) => commands::probe::handle_probe(args).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
