//! # Packrat Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! Foundational pieces shared by the archive library and the CLI:
//! - `config`: Configuration loading, merging, and validation
//! - `error`: The typed `ArchiveError` of the library and the application-level `Result`
//!
//! ```rust
//! use packrat::core::config; // For loading configuration
//! use packrat::core::error::{ArchiveError, ArchiveResult}; // For error handling
//! ```
//!
pub mod config;
pub mod error;
