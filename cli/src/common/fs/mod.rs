//! # Packrat Filesystem Utilities (`common::fs`)
//!
//! File: cli/src/common/fs/mod.rs
//!
//! ## Overview
//!
//! This module groups the filesystem helpers the archive subsystem is built on.
//!
//! ## Architecture
//!
//! - **`probe`**: Read-only path queries (`exists`, `size`, `is_symlink`, `is_dir`,
//!   `modify_time`, `list_files_recursive`). Public API of the crate.
//! - **`io`**: Directory creation with modes, streaming file writes, chmod.
//! - **`links`**: Reading and recreating symbolic links.
//!
//! Import from the specific submodule, e.g. `packrat::common::fs::probe::exists`.
//!

/// Read-only path queries.
pub mod probe;
/// Directory creation, file writing and permission helpers.
pub mod io;
/// Symbolic link reading and creation.
pub mod links;
