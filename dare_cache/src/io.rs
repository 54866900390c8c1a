//! The `CacheReader`/`CacheWriter` trait boundary.
//!
//! Spec §1 puts the concrete file I/O layer out of scope, but
//! `AssetCacheController` (in scope) depends on *some* implementation of
//! it, so this module defines the seam and ships the one concrete,
//! `std::fs`-backed implementation needed to exercise the write/read paths
//! end to end (`dare_engine`'s demo harness, and these crates' own tests).
//!
//! Per spec §9's Open Questions resolution ("a config reader must read
//! exactly `text.len()` bytes and fail otherwise"), the same contract
//! applies here: a read that returns fewer bytes than requested is an
//! error, never a silent partial read.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub trait CacheWriter {
    /// Writes `bytes` at `offset` from the start of the backing file,
    /// pre-reserving the file up to at least `offset + bytes.len()`.
    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> std::io::Result<()>;

    /// Grows (never shrinks) the backing store to at least `capacity`
    /// bytes, matching the spec's "files are pre-reserved at the blob's
    /// default capacity" (§6).
    fn reserve(&mut self, capacity: u64) -> std::io::Result<()>;
}

pub trait CacheReader {
    /// Reads exactly `buf.len()` bytes starting at `offset`. Errors
    /// (rather than silently short-reads) if fewer bytes are available.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> std::io::Result<()>;
}

/// `std::fs`-backed implementation of both traits against one file per
/// `CacheBlock` (spec §6: "Binary cache data is written at offset
/// `object.location` from the start of `<filename>`").
pub struct FileCacheStore {
    path: PathBuf,
    file: File,
}

impl FileCacheStore {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheWriter for FileCacheStore {
    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> std::io::Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(bytes)?;
        self.file.flush()
    }

    fn reserve(&mut self, capacity: u64) -> std::io::Result<()> {
        let current = self.file.metadata()?.len();
        if capacity > current {
            self.file.set_len(capacity)?;
        }
        Ok(())
    }
}

impl CacheReader for FileCacheStore {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> std::io::Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_back_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileCacheStore::open(dir.path().join("block.cache")).unwrap();
        store.reserve(4096).unwrap();
        store.write_at(128, b"hello cache").unwrap();
        let mut buf = vec![0u8; b"hello cache".len()];
        store.read_at(128, &mut buf).unwrap();
        assert_eq!(&buf, b"hello cache");
    }

    #[test]
    fn read_past_eof_errors_rather_than_short_reads() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileCacheStore::open(dir.path().join("block.cache")).unwrap();
        store.reserve(16).unwrap();
        let mut buf = vec![0u8; 64];
        assert!(store.read_at(0, &mut buf).is_err());
    }
}
