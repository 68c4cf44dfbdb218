//! # Packrat Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! Shared helpers for the integration test crates in `cli/tests/`.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::fs;
use std::path::Path;

/// Command for the compiled `packrat` binary.
pub fn packrat_cmd() -> Command {
    Command::cargo_bin("packrat").expect("Failed to find packrat binary for testing")
}

/// `packrat` running inside `dir`, with configuration pinned to an empty file
/// so the developer's own config can't leak into the test.
pub fn packrat_in(dir: &Path) -> Command {
    let config = dir.join("packrat-test-config.toml");
    if !config.exists() {
        fs::write(&config, "").expect("Failed to write empty test config");
    }
    let mut cmd = packrat_cmd();
    cmd.current_dir(dir).env("PACKRAT_CONFIG", &config);
    cmd
}

/// Creates the tree used by most tests under `base`:
///
/// ```text
/// a.txt        "hello"  0644
/// sub/         0755
/// sub/b.txt    "world"  0600
/// ```
pub fn sample_tree(base: &Path) {
    fs::create_dir_all(base.join("sub")).expect("create sub");
    fs::write(base.join("a.txt"), "hello").expect("write a.txt");
    fs::write(base.join("sub/b.txt"), "world").expect("write sub/b.txt");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(base.join("a.txt"), fs::Permissions::from_mode(0o644)).unwrap();
        fs::set_permissions(base.join("sub"), fs::Permissions::from_mode(0o755)).unwrap();
        fs::set_permissions(base.join("sub/b.txt"), fs::Permissions::from_mode(0o600)).unwrap();
    }
}
