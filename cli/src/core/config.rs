//! # Packrat Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module loads, merges and validates the optional configuration that
//! supplies defaults to the `packrat` CLI: the codec and level used when
//! packing, and how the extraction engine treats unsupported entries and
//! implicitly created directories.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. The file named by `PACKRAT_CONFIG`. When set, no other file is read.
//! 2. Project-specific `.packrat.toml` in the current directory or an ancestor.
//!    The search stops at the first directory containing `.git`.
//! 3. User-specific `<config_dir>/packrat/config.toml` (via `directories`).
//! 4. Default values defined in the code.
//!
//! After merging, `~` in paths is expanded and the result is validated
//! (compression levels in range, modes within `0o7777`).
//!
//! ## Examples
//!
//! ```toml
//! [pack]
//! compression = "gzip"
//! gzip_level = 9
//!
//! [unpack]
//! unsupported_entries = "error"
//! dir_mode = 0o755
//! default_destination = "~/restore"
//! ```
//!
//! ```rust,no_run
//! let cfg = packrat::core::config::load_config()?;
//! let options = cfg.unpack.extract_options();
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
use crate::common::archive::compression::{DEFAULT_BZIP2_LEVEL, DEFAULT_GZIP_LEVEL};
use crate::common::archive::extract::DEFAULT_PARENT_DIR_MODE;
use crate::common::archive::{Compression, ExtractOptions, UnsupportedPolicy};
use crate::core::error::{AppError, Result};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "PACKRAT_CONFIG";
const PROJECT_CONFIG_FILENAME: &str = ".packrat.toml";

/// Top-level configuration, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub pack: PackConfig,
    #[serde(default)]
    pub unpack: UnpackConfig,
}

/// Defaults for `packrat pack`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PackConfig {
    /// Codec used when neither `--compression` nor the output name decides.
    #[serde(default)]
    pub compression: Compression,
    #[serde(default = "default_gzip_level")]
    pub gzip_level: u32,
    #[serde(default = "default_bzip2_level")]
    pub bzip2_level: u32,
}

/// Defaults for `packrat unpack`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct UnpackConfig {
    #[serde(default)]
    pub unsupported_entries: UnsupportedPolicy,
    /// Mode for parent directories created implicitly by file and link entries.
    #[serde(default = "default_dir_mode")]
    pub dir_mode: u32,
    /// Destination used when the command line gives none (can use ~).
    #[serde(default)]
    pub default_destination: Option<String>,
}

impl Default for PackConfig {
    fn default() -> Self {
        PackConfig {
            compression: Compression::None,
            gzip_level: default_gzip_level(),
            bzip2_level: default_bzip2_level(),
        }
    }
}

impl Default for UnpackConfig {
    fn default() -> Self {
        UnpackConfig {
            unsupported_entries: UnsupportedPolicy::Skip,
            dir_mode: default_dir_mode(),
            default_destination: None,
        }
    }
}

impl PackConfig {
    /// Configured level for `compression`; `None` for uncompressed output.
    pub fn level_for(&self, compression: Compression) -> Option<u32> {
        match compression {
            Compression::None => None,
            Compression::Gzip => Some(self.gzip_level),
            Compression::Bzip2 => Some(self.bzip2_level),
        }
    }
}

impl UnpackConfig {
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            unsupported: self.unsupported_entries,
            parent_dir_mode: self.dir_mode,
        }
    }
}

fn default_gzip_level() -> u32 {
    DEFAULT_GZIP_LEVEL
}
fn default_bzip2_level() -> u32 {
    DEFAULT_BZIP2_LEVEL
}
fn default_dir_mode() -> u32 {
    DEFAULT_PARENT_DIR_MODE
}

/// Loads the effective configuration for this invocation.
pub fn load_config() -> Result<Config> {
    let mut config = match std::env::var_os(CONFIG_ENV_VAR) {
        Some(explicit) => {
            let path = PathBuf::from(shellexpand::tilde(&explicit.to_string_lossy()).as_ref());
            info!(
                "Loading configuration from {}: {}",
                CONFIG_ENV_VAR,
                path.display()
            );
            load_config_from_path(&path)?
        }
        None => {
            let user_config = load_user_config()?;
            let project_config = load_project_config()?;
            merge_configs(user_config.unwrap_or_default(), project_config)
        }
    };
    expand_config_paths(&mut config);
    validate_config(&config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", config);
    Ok(config)
}

fn load_user_config() -> Result<Option<Config>> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "packrat") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<Config>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    match find_project_config_path(&current_dir) {
        Some(path) => {
            info!("Loading project configuration from: {}", path.display());
            load_config_from_path(&path).map(Some)
        }
        None => {
            debug!("No project configuration file (.packrat.toml) found.");
            Ok(None)
        }
    }
}

/// Walks up from `start` looking for `.packrat.toml`, stopping at a `.git` directory.
fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    let mut path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return None;
        }
        path = path.parent()?;
    }
}

pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Field-wise merge: a project value wins whenever it differs from the default.
fn merge_configs(user: Config, project: Option<Config>) -> Config {
    let Some(project) = project else {
        return user;
    };
    let defaults = Config::default();
    Config {
        pack: PackConfig {
            compression: pick(project.pack.compression, user.pack.compression, defaults.pack.compression),
            gzip_level: pick(project.pack.gzip_level, user.pack.gzip_level, defaults.pack.gzip_level),
            bzip2_level: pick(project.pack.bzip2_level, user.pack.bzip2_level, defaults.pack.bzip2_level),
        },
        unpack: UnpackConfig {
            unsupported_entries: pick(
                project.unpack.unsupported_entries,
                user.unpack.unsupported_entries,
                defaults.unpack.unsupported_entries,
            ),
            dir_mode: pick(project.unpack.dir_mode, user.unpack.dir_mode, defaults.unpack.dir_mode),
            default_destination: project
                .unpack
                .default_destination
                .or(user.unpack.default_destination),
        },
    }
}

fn pick<T: PartialEq>(project: T, user: T, default: T) -> T {
    if project != default {
        project
    } else {
        user
    }
}

fn expand_config_paths(config: &mut Config) {
    if let Some(dest) = config.unpack.default_destination.as_mut() {
        *dest = shellexpand::tilde(dest.as_str()).into_owned();
        debug!("Expanded default destination: {}", dest);
    }
}

fn validate_config(config: &Config) -> Result<()> {
    if config.pack.gzip_level > 9 {
        return Err(anyhow!(AppError::Config(format!(
            "pack.gzip_level must be between 0 and 9, got {}",
            config.pack.gzip_level
        ))));
    }
    if !(1..=9).contains(&config.pack.bzip2_level) {
        return Err(anyhow!(AppError::Config(format!(
            "pack.bzip2_level must be between 1 and 9, got {}",
            config.pack.bzip2_level
        ))));
    }
    if config.unpack.dir_mode > 0o7777 {
        return Err(anyhow!(AppError::Config(format!(
            "unpack.dir_mode {:#o} is not a permission mode",
            config.unpack.dir_mode
        ))));
    }
    if let Some(dest) = &config.unpack.default_destination {
        if dest.is_empty() {
            return Err(anyhow!(AppError::Config(
                "unpack.default_destination cannot be empty".to_string()
            )));
        }
    }
    Ok(())
}
