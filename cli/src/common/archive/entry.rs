//! # Packrat Archive Entry Model
//!
//! File: cli/src/common/archive/entry.rs
//!
//! ## Overview
//!
//! `ArchiveEntry` is the one record the writer produces per filesystem object
//! and the extraction engine consumes per tar header. The kind of object is a
//! closed tagged enum (`EntryKind`), so every per-kind `match` in the crate is
//! checked for exhaustiveness by the compiler.
//!
//! Entry content is never held here. While packing it is streamed from the
//! source file; while unpacking it is the `tar::Entry` reader itself.
//!
//! `PackRequest` and `UnpackRequest` are the caller-built, single-use inputs of
//! the two operations.
//!
use super::compression::Compression;
use crate::core::error::{ArchiveError, ArchiveResult};
use std::fmt;
use std::fs::Metadata;
use std::io::Read;
use std::path::PathBuf;

/// Entry kinds the extraction engine does not materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtherKind {
    HardLink,
    CharDevice,
    BlockDevice,
    Fifo,
    Socket,
    /// Any other tar type flag (global PAX headers, vendor extensions, ...).
    Unknown(u8),
}

impl fmt::Display for OtherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OtherKind::HardLink => write!(f, "hard link"),
            OtherKind::CharDevice => write!(f, "character device"),
            OtherKind::BlockDevice => write!(f, "block device"),
            OtherKind::Fifo => write!(f, "fifo"),
            OtherKind::Socket => write!(f, "socket"),
            OtherKind::Unknown(flag) => write!(f, "type flag {:?}", *flag as char),
        }
    }
}

/// What an entry describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    /// A regular file whose content stream is exactly `size` bytes.
    RegularFile { size: u64 },
    /// A symbolic link; `target` is never empty.
    Symlink { target: PathBuf },
    Other(OtherKind),
}

/// One filesystem object written to or read from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path relative to the archive root, as recorded by the writer.
    pub name: PathBuf,
    /// Permission and type bits.
    pub mode: u32,
    pub kind: EntryKind,
}

impl ArchiveEntry {
    /// Builds an entry from `symlink_metadata` of an object found while packing.
    ///
    /// `link_target` must be the link's target text when `metadata` describes a
    /// symlink; it is ignored otherwise.
    pub fn from_metadata(
        name: PathBuf,
        metadata: &Metadata,
        link_target: Option<PathBuf>,
    ) -> ArchiveResult<Self> {
        let file_type = metadata.file_type();
        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::RegularFile {
                size: metadata.len(),
            }
        } else if file_type.is_symlink() {
            match link_target {
                Some(target) if !target.as_os_str().is_empty() => EntryKind::Symlink { target },
                _ => {
                    return Err(ArchiveError::Io {
                        path: name,
                        source: std::io::Error::other("symlink has an empty target"),
                    })
                }
            }
        } else {
            EntryKind::Other(special_kind(metadata))
        };

        Ok(ArchiveEntry {
            name,
            mode: metadata_mode(metadata),
            kind,
        })
    }

    /// Whether a header is a pax extended-attribute record rather than a
    /// filesystem object. Such records carry metadata only and never become an entry.
    pub fn is_metadata_record(entry_type: tar::EntryType) -> bool {
        entry_type.is_pax_global_extensions() || entry_type.is_pax_local_extensions()
    }

    /// Decodes the header of a tar entry. The entry's content is left unread.
    pub fn from_tar<R: Read>(entry: &tar::Entry<'_, R>) -> ArchiveResult<Self> {
        let name = entry
            .path()
            .map_err(|e| ArchiveError::decode("entry path", e))?
            .into_owned();
        let header = entry.header();
        let mode = header
            .mode()
            .map_err(|e| ArchiveError::decode(format!("mode of {}", name.display()), e))?;

        let entry_type = header.entry_type();
        let kind = if entry_type.is_dir() {
            EntryKind::Directory
        } else if entry_type.is_file() || entry_type.is_contiguous() || entry_type.is_gnu_sparse()
        {
            EntryKind::RegularFile { size: entry.size() }
        } else if entry_type.is_symlink() {
            let target = entry
                .link_name()
                .map_err(|e| ArchiveError::decode(format!("link target of {}", name.display()), e))?
                .map(|t| t.into_owned())
                .filter(|t| !t.as_os_str().is_empty())
                .ok_or_else(|| {
                    ArchiveError::decode(
                        format!("symlink {}", name.display()),
                        std::io::Error::new(
                            std::io::ErrorKind::InvalidData,
                            "symlink entry without a target",
                        ),
                    )
                })?;
            EntryKind::Symlink { target }
        } else if entry_type.is_hard_link() {
            EntryKind::Other(OtherKind::HardLink)
        } else if entry_type.is_character_special() {
            EntryKind::Other(OtherKind::CharDevice)
        } else if entry_type.is_block_special() {
            EntryKind::Other(OtherKind::BlockDevice)
        } else if entry_type.is_fifo() {
            EntryKind::Other(OtherKind::Fifo)
        } else {
            EntryKind::Other(OtherKind::Unknown(entry_type.as_byte()))
        };

        Ok(ArchiveEntry { name, mode, kind })
    }

    /// Overwrites the type, mode and size fields of `header` from this entry.
    ///
    /// Ownership and timestamps are expected to be filled in beforehand from the
    /// source metadata. Sockets have no tar type of their own; the writer skips
    /// them before a header is built.
    pub fn apply_to_header(&self, header: &mut tar::Header) {
        let (entry_type, size) = match &self.kind {
            EntryKind::Directory => (tar::EntryType::Directory, 0),
            EntryKind::RegularFile { size } => (tar::EntryType::Regular, *size),
            EntryKind::Symlink { .. } => (tar::EntryType::Symlink, 0),
            EntryKind::Other(OtherKind::HardLink) => (tar::EntryType::Link, 0),
            EntryKind::Other(OtherKind::CharDevice) => (tar::EntryType::Char, 0),
            EntryKind::Other(OtherKind::BlockDevice) => (tar::EntryType::Block, 0),
            EntryKind::Other(OtherKind::Fifo | OtherKind::Socket) => (tar::EntryType::Fifo, 0),
            EntryKind::Other(OtherKind::Unknown(flag)) => (tar::EntryType::new(*flag), 0),
        };
        header.set_entry_type(entry_type);
        header.set_mode(self.mode);
        header.set_size(size);
    }

    /// Short label used when listing archives.
    pub fn kind_label(&self) -> String {
        match &self.kind {
            EntryKind::Directory => "dir".to_string(),
            EntryKind::RegularFile { .. } => "file".to_string(),
            EntryKind::Symlink { .. } => "symlink".to_string(),
            EntryKind::Other(other) => other.to_string(),
        }
    }
}

impl fmt::Display for ArchiveEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o} ", self.mode & 0o7777)?;
        match &self.kind {
            EntryKind::Directory => write!(f, "{:>10} {}/", "-", self.name.display()),
            EntryKind::RegularFile { size } => write!(f, "{:>10} {}", size, self.name.display()),
            EntryKind::Symlink { target } => write!(
                f,
                "{:>10} {} -> {}",
                "-",
                self.name.display(),
                target.display()
            ),
            EntryKind::Other(other) => {
                write!(f, "{:>10} {} ({})", "-", self.name.display(), other)
            }
        }
    }
}

#[cfg(unix)]
fn metadata_mode(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    metadata.mode()
}

#[cfg(not(unix))]
fn metadata_mode(metadata: &Metadata) -> u32 {
    if metadata.is_dir() {
        0o755
    } else if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

#[cfg(unix)]
fn special_kind(metadata: &Metadata) -> OtherKind {
    use std::os::unix::fs::FileTypeExt;
    let file_type = metadata.file_type();
    if file_type.is_char_device() {
        OtherKind::CharDevice
    } else if file_type.is_block_device() {
        OtherKind::BlockDevice
    } else if file_type.is_fifo() {
        OtherKind::Fifo
    } else {
        OtherKind::Socket
    }
}

#[cfg(not(unix))]
fn special_kind(_metadata: &Metadata) -> OtherKind {
    OtherKind::Unknown(b'?')
}

/// Input of `pack`: which paths under `base_dir` go into `output_path`.
#[derive(Debug, Clone)]
pub struct PackRequest {
    /// Directory all entry names are computed against.
    pub base_dir: PathBuf,
    /// Files or directories, relative to `base_dir`, archived in this order.
    pub inputs: Vec<PathBuf>,
    /// Archive file to create (truncated if it exists).
    pub output_path: PathBuf,
    /// Framing applied around the tar stream.
    pub compression: Compression,
    /// Codec level; `None` picks the codec default.
    pub level: Option<u32>,
}

impl PackRequest {
    pub fn new<I, P>(base_dir: impl Into<PathBuf>, inputs: I, output_path: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        PackRequest {
            base_dir: base_dir.into(),
            inputs: inputs.into_iter().map(Into::into).collect(),
            output_path: output_path.into(),
            compression: Compression::None,
            level: None,
        }
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }
}

/// Input of `unpack`: which archive, where to, and how it is framed.
#[derive(Debug, Clone)]
pub struct UnpackRequest {
    pub archive_path: PathBuf,
    pub dest_dir: PathBuf,
    pub compression: Compression,
}

impl UnpackRequest {
    pub fn new(
        archive_path: impl Into<PathBuf>,
        dest_dir: impl Into<PathBuf>,
        compression: Compression,
    ) -> Self {
        UnpackRequest {
            archive_path: archive_path.into(),
            dest_dir: dest_dir.into(),
            compression,
        }
    }
}
