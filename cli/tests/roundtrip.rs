//! # Packrat Archive Round-Trip Tests
//!
//! File: cli/tests/roundtrip.rs
//!
//! Library-level tests for `pack` and the reader front-ends: trees survive a
//! pack/unpack cycle with content, modes and link targets intact, for every
//! codec, and the documented failure modes surface as the right error.
//!
mod common;

use common::sample_tree;
use packrat::common::archive::{
    self, Compression, EntryKind, PackRequest, UnpackRequest,
};
use packrat::common::fs::probe;
use packrat::core::error::ArchiveError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use walkdir::WalkDir;

#[derive(Debug, PartialEq, Eq)]
enum Node {
    Dir { mode: u32 },
    File { content: Vec<u8>, mode: u32 },
    Link { target: PathBuf },
}

fn mode_of(metadata: &fs::Metadata) -> u32 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o7777
    }
    #[cfg(not(unix))]
    {
        let _ = metadata;
        0
    }
}

/// Everything below `root` (excluding `root`), keyed by relative path.
fn snapshot(root: &Path) -> BTreeMap<String, Node> {
    let mut nodes = BTreeMap::new();
    for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
        let entry = entry.unwrap();
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap()
            .to_string_lossy()
            .replace('\\', "/");
        let metadata = fs::symlink_metadata(entry.path()).unwrap();
        let node = if metadata.file_type().is_symlink() {
            Node::Link {
                target: fs::read_link(entry.path()).unwrap(),
            }
        } else if metadata.is_dir() {
            Node::Dir {
                mode: mode_of(&metadata),
            }
        } else {
            Node::File {
                content: fs::read(entry.path()).unwrap(),
                mode: mode_of(&metadata),
            }
        };
        nodes.insert(relative, node);
    }
    nodes
}

/// A tree with nested directories, unusual modes and (on Unix) symlinks.
fn rich_tree(base: &Path) {
    sample_tree(base);
    fs::create_dir_all(base.join("deep/nested/dirs")).unwrap();
    fs::write(base.join("deep/nested/dirs/leaf.bin"), [0u8, 1, 2, 255]).unwrap();
    fs::write(base.join("deep/empty.txt"), "").unwrap();
    fs::write(base.join("big.txt"), "0123456789".repeat(10_000)).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::{symlink, PermissionsExt};
        fs::write(base.join("run.sh"), "#!/bin/sh\necho hi\n").unwrap();
        fs::set_permissions(base.join("run.sh"), fs::Permissions::from_mode(0o755)).unwrap();
        fs::set_permissions(base.join("deep/nested"), fs::Permissions::from_mode(0o750))
            .unwrap();
        symlink("a.txt", base.join("link-to-file")).unwrap();
        symlink("sub", base.join("link-to-dir")).unwrap();
        symlink("does/not/exist", base.join("dangling")).unwrap();
        symlink("../a.txt", base.join("sub/up-link")).unwrap();
    }
}

fn pack_all(base: &Path, output: &Path, compression: Compression) {
    archive::pack(&PackRequest::new(base, ["."], output).with_compression(compression))
        .expect("pack failed");
}

#[test]
fn test_round_trip_reproduces_tree() {
    let work = tempdir().unwrap();
    let base = work.path().join("base");
    let dest = work.path().join("dest");
    fs::create_dir(&base).unwrap();
    rich_tree(&base);

    let output = work.path().join("tree.tar");
    pack_all(&base, &output, Compression::None);
    archive::unpack_plain(&output, &dest).unwrap();

    assert_eq!(snapshot(&base), snapshot(&dest));
}

#[test]
fn test_compressed_round_trips_match_plain() {
    let work = tempdir().unwrap();
    let base = work.path().join("base");
    fs::create_dir(&base).unwrap();
    rich_tree(&base);
    let expected = snapshot(&base);

    type FrontEnd = fn(&Path, &Path) -> packrat::core::error::ArchiveResult<()>;
    let cases: [(Compression, FrontEnd); 3] = [
        (Compression::None, archive::unpack_plain),
        (Compression::Gzip, archive::unpack_gzip),
        (Compression::Bzip2, archive::unpack_bzip2),
    ];
    for (compression, front_end) in cases {
        let output = work.path().join(format!("tree.{}", compression.extension()));
        pack_all(&base, &output, compression);
        assert_eq!(Compression::detect(&output).unwrap(), compression);

        let dest = work.path().join(format!("dest-{}", compression));
        front_end(&output, &dest).unwrap();
        assert_eq!(snapshot(&dest), expected, "{} round trip differs", compression);

        // The generic entry point agrees with the dedicated one.
        let generic = work.path().join(format!("generic-{}", compression));
        archive::unpack(&UnpackRequest::new(&output, &generic, compression)).unwrap();
        assert_eq!(snapshot(&generic), expected);
    }
}

#[test]
fn test_concrete_scenario() {
    let work = tempdir().unwrap();
    let base = work.path().join("base");
    let dest = work.path().join("dest");
    fs::create_dir(&base).unwrap();
    fs::create_dir(&dest).unwrap();
    sample_tree(&base);

    let output = work.path().join("out.tar");
    archive::pack(&PackRequest::new(&base, ["a.txt", "sub"], &output)).unwrap();
    archive::unpack_plain(&output, &dest).unwrap();

    assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "hello");
    assert_eq!(fs::read_to_string(dest.join("sub/b.txt")).unwrap(), "world");
    assert!(dest.join("sub").is_dir());
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(dest.join("a.txt")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}

#[test]
fn test_unpack_twice_overwrites_files() {
    let work = tempdir().unwrap();
    let base = work.path().join("base");
    let dest = work.path().join("dest");
    fs::create_dir(&base).unwrap();
    sample_tree(&base);
    let output = work.path().join("out.tar.gz");
    pack_all(&base, &output, Compression::Gzip);

    archive::unpack_gzip(&output, &dest).unwrap();
    fs::write(dest.join("a.txt"), "locally modified and longer").unwrap();
    archive::unpack_gzip(&output, &dest).unwrap();

    assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "hello");
    assert_eq!(snapshot(&base), snapshot(&dest));
}

#[cfg(unix)]
#[test]
fn test_unpack_twice_with_read_only_entries() {
    use std::os::unix::fs::PermissionsExt;
    let work = tempdir().unwrap();
    let base = work.path().join("base");
    let dest = work.path().join("dest");
    fs::create_dir_all(base.join("sealed")).unwrap();
    fs::write(base.join("ro.txt"), "frozen").unwrap();
    fs::write(base.join("sealed/inner.txt"), "inside").unwrap();
    fs::set_permissions(base.join("ro.txt"), fs::Permissions::from_mode(0o444)).unwrap();
    fs::set_permissions(base.join("sealed/inner.txt"), fs::Permissions::from_mode(0o444)).unwrap();
    fs::set_permissions(base.join("sealed"), fs::Permissions::from_mode(0o555)).unwrap();
    let output = work.path().join("ro.tar");
    archive::pack(&PackRequest::new(&base, ["ro.txt", "sealed"], &output)).unwrap();

    archive::unpack_plain(&output, &dest).unwrap();
    archive::unpack_plain(&output, &dest).unwrap();
    assert_eq!(snapshot(&base), snapshot(&dest));

    for dir in [&base, &dest] {
        fs::set_permissions(dir.join("sealed"), fs::Permissions::from_mode(0o755)).unwrap();
    }
}

#[cfg(unix)]
#[test]
fn test_symlink_conflict_is_already_exists() {
    let work = tempdir().unwrap();
    let base = work.path().join("base");
    let dest = work.path().join("dest");
    fs::create_dir(&base).unwrap();
    fs::write(base.join("target.txt"), "t").unwrap();
    std::os::unix::fs::symlink("target.txt", base.join("link")).unwrap();
    let output = work.path().join("links.tar");
    archive::pack(&PackRequest::new(&base, ["target.txt", "link"], &output)).unwrap();

    archive::unpack_plain(&output, &dest).unwrap();
    let second = archive::unpack_plain(&output, &dest);
    assert!(matches!(second, Err(ArchiveError::AlreadyExists { .. })));
}

#[test]
fn test_corrupt_gzip_writes_no_files() {
    let work = tempdir().unwrap();
    let dest = work.path().join("dest");
    let bogus = work.path().join("bogus.tar.gz");
    // Gzip magic followed by garbage.
    let mut bytes = vec![0x1f, 0x8b];
    bytes.extend(std::iter::repeat(0xAB).take(600));
    fs::write(&bogus, bytes).unwrap();

    let result = archive::unpack_gzip(&bogus, &dest);
    assert!(matches!(result, Err(ArchiveError::Decode { .. })));
    let written: Vec<_> = WalkDir::new(&dest)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .collect();
    assert!(written.is_empty());
}

#[test]
fn test_truncated_bzip2_is_decode_error() {
    let work = tempdir().unwrap();
    let base = work.path().join("base");
    fs::create_dir(&base).unwrap();
    rich_tree(&base);
    let output = work.path().join("tree.tar.bz2");
    pack_all(&base, &output, Compression::Bzip2);

    let bytes = fs::read(&output).unwrap();
    let truncated = work.path().join("truncated.tar.bz2");
    fs::write(&truncated, &bytes[..bytes.len() / 2]).unwrap();

    let result = archive::unpack_bzip2(&truncated, &work.path().join("dest"));
    assert!(matches!(result, Err(ArchiveError::Decode { .. })));
}

#[test]
fn test_list_entries_reports_kinds() {
    let work = tempdir().unwrap();
    let base = work.path().join("base");
    fs::create_dir(&base).unwrap();
    sample_tree(&base);
    let output = work.path().join("out.tar.bz2");
    pack_all(&base, &output, Compression::Bzip2);

    let entries = archive::list_entries(&output, Compression::Bzip2).unwrap();
    let by_name: BTreeMap<String, &EntryKind> = entries
        .iter()
        .map(|e| (e.name.to_string_lossy().replace('\\', "/"), &e.kind))
        .collect();
    assert_eq!(by_name["a.txt"], &EntryKind::RegularFile { size: 5 });
    assert_eq!(by_name["sub"], &EntryKind::Directory);
    assert_eq!(by_name["sub/b.txt"], &EntryKind::RegularFile { size: 5 });
    assert_eq!(by_name.len(), 3);
}

#[test]
fn test_probe_properties() {
    let work = tempdir().unwrap();
    let root = work.path().join("tree");
    fs::create_dir(&root).unwrap();
    sample_tree(&root);
    fs::create_dir_all(root.join("x/y")).unwrap();
    fs::write(root.join("x/y/z.txt"), "z").unwrap();

    // 3 regular files, 3 directories below the root.
    let files = probe::list_files_recursive(&root).unwrap();
    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|f| f.is_absolute() && !f.is_dir()));

    let fresh = root.join("fresh.txt");
    fs::write(&fresh, "12345678").unwrap();
    assert!(probe::exists(&fresh));
    assert_eq!(probe::size(&fresh).unwrap(), 8);
    assert!(!probe::is_dir(&fresh));
    assert!(!probe::is_symlink(&fresh).unwrap());
    fs::remove_file(&fresh).unwrap();
    assert!(!probe::exists(&fresh));
    assert!(matches!(
        probe::size(&fresh),
        Err(ArchiveError::NotFound { .. })
    ));
}

#[test]
fn test_concurrent_packs_use_no_shared_state() {
    let work = tempdir().unwrap();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let root = work.path().join(format!("job{i}"));
            std::thread::spawn(move || {
                let base = root.join("base");
                fs::create_dir_all(&base).unwrap();
                fs::write(base.join("id.txt"), i.to_string()).unwrap();
                let output = root.join("out.tar");
                archive::pack(&PackRequest::new(&base, ["id.txt"], &output)).unwrap();
                archive::unpack_plain(&output, &root.join("dest")).unwrap();
                fs::read_to_string(root.join("dest/id.txt")).unwrap()
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), i.to_string());
    }
}
