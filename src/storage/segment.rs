//! Segment
//!
//! A store and an index sharing one numeric id, sealed once either grows
//! past its configured limit.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SegmentLimits;
use crate::error::Result;

use super::{Index, Store};

/// File extension of a segment's record log
pub const STORE_EXTENSION: &str = "store";

/// File extension of a segment's index
pub const INDEX_EXTENSION: &str = "index";

/// One record log plus its index
pub struct Segment {
    id: u64,
    store: Store,
    index: Index,
    limits: SegmentLimits,
}

impl Segment {
    /// Open or create segment `id` inside `dir`
    pub fn open(dir: &Path, id: u64, limits: SegmentLimits) -> Result<Self> {
        let store = Store::open(&Self::file_path(dir, id, STORE_EXTENSION))?;
        let index = Index::open(&Self::file_path(dir, id, INDEX_EXTENSION))?;

        Ok(Self {
            id,
            store,
            index,
            limits,
        })
    }

    /// Append `data` and index it under `key`
    pub fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let (_, pos) = self.store.append(data)?;
        self.index.write(key, pos)
    }

    /// Read the latest record stored under `key`
    pub fn read(&self, key: &str) -> Result<Vec<u8>> {
        let pos = self.index.read(key)?;
        self.store.read(pos)
    }

    /// Tombstone every index entry for `key`
    ///
    /// Store bytes stay in place. Returns the positions that were dropped.
    pub fn delete(&self, key: &str) -> Result<Vec<u64>> {
        self.index.delete(key)
    }

    /// True once the store or the index reached its limit
    pub fn is_maxed(&self) -> bool {
        self.store.size() >= self.limits.max_store_bytes
            || self.index.size() >= self.limits.max_index_bytes
    }

    /// Flush buffered writes of both files
    pub fn flush(&self) -> Result<()> {
        self.store.flush()?;
        self.index.flush()
    }

    /// Flush and sync both files
    pub fn close(&self) -> Result<()> {
        self.index.close()?;
        self.store.close()
    }

    /// Close the segment and delete both files
    pub fn remove(self) -> Result<()> {
        self.close()?;
        let index_path = self.index.path().to_path_buf();
        let store_path = self.store.path().to_path_buf();
        drop(self);

        fs::remove_file(index_path)?;
        fs::remove_file(store_path)?;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Segment id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current store size in bytes
    pub fn store_size(&self) -> u64 {
        self.store.size()
    }

    /// Current index size in bytes
    pub fn index_size(&self) -> u64 {
        self.index.size()
    }

    /// Number of live keys in the index
    pub fn key_count(&self) -> usize {
        self.index.len()
    }

    /// Path of a segment file: "{dir}/{id}.{ext}"
    pub fn file_path(dir: &Path, id: u64, extension: &str) -> PathBuf {
        dir.join(format!("{}.{}", id, extension))
    }

    /// Parse (id, extension) from a segment file name
    /// "42.store" → Some((42, "store"))
    pub fn parse_file_name(path: &Path) -> Option<(u64, &str)> {
        let extension = path.extension()?.to_str()?;
        if extension != STORE_EXTENSION && extension != INDEX_EXTENSION {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let id: u64 = stem.parse().ok()?;
        if id == 0 || id.to_string() != stem {
            return None;
        }
        Some((id, extension))
    }
}
