//! # Packrat
//!
//! File: cli/src/lib.rs
//!
//! ## Overview
//!
//! Library half of the `packrat` crate: packs directory subtrees into tar
//! archives (uncompressed, gzip or bzip2) and unpacks them again, preserving
//! relative names, permission bits and symbolic links. Also exposes the small
//! filesystem probe toolkit the CLI is built on.
//!
//! - `common::archive`: pack, unpack, list.
//! - `common::fs`: probes (`exists`, `size`, `is_symlink`, `is_dir`,
//!   `modify_time`, `list_files_recursive`) and filesystem primitives.
//! - `core::error`: `ArchiveError`, the error every library operation returns.
//! - `core::config`: CLI defaults loaded from TOML.
//!
//! Operations are synchronous and never change the process working directory,
//! so independent pack/unpack calls may run on separate threads.
//!
pub mod common;
pub mod core;
