//! # Packrat Compression Utilities (`common::archive::compression`)
//!
//! File: cli/src/common/archive/compression.rs
//!
//! ## Overview
//!
//! The byte-stream framing layered around a tar container: none, gzip or
//! bzip2. The reader front-ends use `wrap_reader` as their decompression
//! filter; the writer uses `Compression::encoder` and must call
//! `Encoder::finish` once the tar end marker has been written.
//!
//! ## Architecture
//!
//! - `Compression`: the codec choice, parseable from CLI/config strings.
//! - `Compression::from_path` / `sniff` / `detect`: codec inference from a file
//!   name, from magic bytes, or both (magic bytes win).
//! - `Encoder<W>`: a `Write` adapter over `flate2` / `bzip2` encoders.
//!
//! Concatenated gzip members and multi-stream bzip2 files (as produced by
//! `pigz`/`pbzip2`) decode as one stream.
//!
use crate::core::error::{ArchiveError, ArchiveResult};
use bzip2::read::MultiBzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::str::FromStr;

/// Default gzip level (zlib's default).
pub const DEFAULT_GZIP_LEVEL: u32 = 6;
/// Default bzip2 level (block size 900k, the `bzip2` CLI default).
pub const DEFAULT_BZIP2_LEVEL: u32 = 9;

/// Framing applied around the tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Bzip2,
}

impl Compression {
    /// Infers the codec from the file name, or `None` if the name is not a
    /// recognized tar archive name.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Compression::Gzip)
        } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") || name.ends_with(".tbz")
        {
            Some(Compression::Bzip2)
        } else if name.ends_with(".tar") {
            Some(Compression::None)
        } else {
            None
        }
    }

    /// Infers the codec from the first bytes of a file.
    ///
    /// Returns `Some(None)` for an uncompressed tar (ustar magic at offset 257)
    /// and `None` when nothing is recognized.
    pub fn sniff(prefix: &[u8]) -> Option<Self> {
        if prefix.starts_with(&[0x1f, 0x8b]) {
            Some(Compression::Gzip)
        } else if prefix.starts_with(b"BZh") {
            Some(Compression::Bzip2)
        } else if prefix.len() >= 262 && &prefix[257..262] == b"ustar" {
            Some(Compression::None)
        } else {
            None
        }
    }

    /// Detects the codec of an existing archive: magic bytes first, then the
    /// file name, falling back to no compression.
    pub fn detect(path: &Path) -> ArchiveResult<Self> {
        let mut file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
        let mut prefix = [0u8; 512];
        let mut filled = 0;
        while filled < prefix.len() {
            match file.read(&mut prefix[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ArchiveError::io(path, e)),
            }
        }
        Ok(Self::sniff(&prefix[..filled])
            .or_else(|| Self::from_path(path))
            .unwrap_or_default())
    }

    /// Layers the matching decompression filter over `reader`.
    pub fn wrap_reader<'a, R: Read + 'a>(self, reader: R) -> Box<dyn Read + 'a> {
        match self {
            Compression::None => Box::new(reader),
            Compression::Gzip => Box::new(MultiGzDecoder::new(reader)),
            Compression::Bzip2 => Box::new(MultiBzDecoder::new(reader)),
        }
    }

    /// Layers the matching encoder over `writer`. `level` is clamped to the
    /// codec's valid range; `None` uses the codec default.
    pub fn encoder<W: Write>(self, writer: W, level: Option<u32>) -> Encoder<W> {
        match self {
            Compression::None => Encoder::Plain(writer),
            Compression::Gzip => {
                let level = level.unwrap_or(DEFAULT_GZIP_LEVEL).min(9);
                Encoder::Gzip(GzEncoder::new(writer, flate2::Compression::new(level)))
            }
            Compression::Bzip2 => {
                let level = level.unwrap_or(DEFAULT_BZIP2_LEVEL).clamp(1, 9);
                Encoder::Bzip2(BzEncoder::new(writer, bzip2::Compression::new(level)))
            }
        }
    }

    /// Conventional file name suffix for archives using this codec.
    pub fn extension(self) -> &'static str {
        match self {
            Compression::None => "tar",
            Compression::Gzip => "tar.gz",
            Compression::Bzip2 => "tar.bz2",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Bzip2 => "bzip2",
        };
        f.write_str(name)
    }
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "tar" => Ok(Compression::None),
            "gzip" | "gz" | "tgz" => Ok(Compression::Gzip),
            "bzip2" | "bz2" | "tbz2" => Ok(Compression::Bzip2),
            other => Err(format!(
                "unknown compression '{other}' (expected none, gzip or bzip2)"
            )),
        }
    }
}

/// Writer that compresses (or passes through) everything written to it.
pub enum Encoder<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
    Bzip2(BzEncoder<W>),
}

impl<W: Write> Encoder<W> {
    /// Writes the codec trailer and returns the inner writer.
    pub fn finish(self) -> io::Result<W> {
        match self {
            Encoder::Plain(mut w) => {
                w.flush()?;
                Ok(w)
            }
            Encoder::Gzip(e) => e.finish(),
            Encoder::Bzip2(e) => e.finish(),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Encoder::Plain(w) => w.write(buf),
            Encoder::Gzip(e) => e.write(buf),
            Encoder::Bzip2(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Encoder::Plain(w) => w.flush(),
            Encoder::Gzip(e) => e.flush(),
            Encoder::Bzip2(e) => e.flush(),
        }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn round_trip(compression: Compression) -> io::Result<Vec<u8>> {
        let data = b"Some data to compress, some data to compress.".repeat(20);
        let mut encoder = compression.encoder(Vec::new(), None);
        encoder.write_all(&data)?;
        let compressed = encoder.finish()?;

        let mut decompressed = Vec::new();
        compression
            .wrap_reader(compressed.as_slice())
            .read_to_end(&mut decompressed)?;
        assert_eq!(decompressed, data);
        Ok(compressed)
    }

    #[test]
    fn test_codecs_round_trip_and_carry_magic() -> io::Result<()> {
        assert_eq!(Compression::sniff(&round_trip(Compression::Gzip)?), Some(Compression::Gzip));
        assert_eq!(
            Compression::sniff(&round_trip(Compression::Bzip2)?),
            Some(Compression::Bzip2)
        );
        round_trip(Compression::None)?;
        Ok(())
    }

    #[test]
    fn test_from_path() {
        let cases = [
            ("a.tar", Some(Compression::None)),
            ("a.TAR.GZ", Some(Compression::Gzip)),
            ("a.tgz", Some(Compression::Gzip)),
            ("a.tar.bz2", Some(Compression::Bzip2)),
            ("a.tbz", Some(Compression::Bzip2)),
            ("a.zip", None),
        ];
        for (name, expected) in cases {
            assert_eq!(Compression::from_path(&PathBuf::from(name)), expected, "{name}");
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("GZIP".parse::<Compression>(), Ok(Compression::Gzip));
        assert_eq!("bz2".parse::<Compression>(), Ok(Compression::Bzip2));
        assert_eq!("none".parse::<Compression>(), Ok(Compression::None));
        assert!("xz".parse::<Compression>().is_err());
    }

    #[test]
    fn test_invalid_gzip_fails_to_read() {
        let mut out = Vec::new();
        let result = Compression::Gzip
            .wrap_reader(&b"definitely not gzip"[..])
            .read_to_end(&mut out);
        assert!(result.is_err());
    }

    #[test]
    fn test_detect_prefers_magic_over_name() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let misnamed = dir.path().join("bundle.tar");
        let mut encoder = Compression::Gzip.encoder(File::create(&misnamed)?, None);
        encoder.write_all(b"payload")?;
        encoder.finish()?;
        assert_eq!(Compression::detect(&misnamed)?, Compression::Gzip);

        let unknown = dir.path().join("notes.bin");
        std::fs::write(&unknown, "plain")?;
        assert_eq!(Compression::detect(&unknown)?, Compression::None);
        Ok(())
    }
}
