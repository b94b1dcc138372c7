//! Partition
//!
//! Manages the segments of one key-space shard and coordinates reads/writes.
//!
//! ## Responsibilities
//! - Discover existing segments on startup
//! - Keep a single active segment, rotating when it is maxed
//! - Keep at most one live copy of every key across segments
//! - Search segments newest → oldest for reads

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::config::SegmentLimits;
use crate::error::{Result, ShardError};
use crate::item::Item;

use super::segment::{Segment, INDEX_EXTENSION, STORE_EXTENSION};

/// One shard of the key space
///
/// ## Concurrency:
/// - `state`: Protected by RwLock (reads share it; puts, deletes and rotation
///   take it exclusively, so a rotation never races a read)
/// - All methods use `&self`
pub struct Partition {
    /// Partition id (1-based)
    id: u32,

    /// Directory holding this partition's segment files
    dir: PathBuf,

    /// Limits applied to every segment
    limits: SegmentLimits,

    state: RwLock<PartitionState>,
}

struct PartitionState {
    /// Open segments, ordered oldest → newest by id
    segments: Vec<Segment>,

    /// Position of the active segment in `segments`
    active: usize,

    /// Id for the next segment created
    next_segment_id: u64,
}

impl Partition {
    /// Open or create partition `id` under `base_dir`
    ///
    /// On startup:
    /// 1. Create "{base_dir}/{id}" if it doesn't exist
    /// 2. Pair "{n}.store" with "{n}.index", ignoring unpaired files
    /// 3. Open segments in ascending id order
    /// 4. Create a fresh active segment if every recovered one is maxed
    pub fn open(base_dir: &Path, id: u32, limits: SegmentLimits) -> Result<Self> {
        let dir = base_dir.join(id.to_string());
        fs::create_dir_all(&dir)?;
        let limits = limits.or_default();

        let mut state = PartitionState {
            segments: Vec::new(),
            active: 0,
            next_segment_id: 1,
        };
        let mut has_active = false;

        for segment_id in Self::discover_segments(&dir)? {
            let segment = Segment::open(&dir, segment_id, limits)?;
            if !segment.is_maxed() {
                state.active = state.segments.len();
                has_active = true;
            }
            state.segments.push(segment);
            state.next_segment_id = segment_id + 1;
        }

        let recovered = state.segments.len();
        if !has_active {
            Self::push_segment(&dir, limits, &mut state)?;
        }

        tracing::debug!(
            partition = id,
            recovered,
            active = state.segments[state.active].id(),
            "partition opened"
        );

        Ok(Self {
            id,
            dir,
            limits,
            state: RwLock::new(state),
        })
    }

    /// Store `item`, replacing any live copy
    ///
    /// Returns the previous value if the key was live in any segment.
    /// An item that fails to encode leaves the partition untouched.
    pub fn put<I: Item>(&self, item: &I) -> Result<Option<I>> {
        let data = item.encode()?;

        let mut state = self.state.write();
        let key = item.hex_key();

        if state.segments[state.active].is_maxed() {
            Self::push_segment(&self.dir, self.limits, &mut state)?;
        }

        let mut previous = item.clone();
        let found = Self::locate(&state.segments, key, &mut previous)?;

        // A live copy outside the active segment must go before the new write
        if let Some(pos) = found {
            if pos != state.active {
                tracing::debug!(
                    partition = self.id,
                    segment = state.segments[pos].id(),
                    key,
                    "invalidating stale copy"
                );
                ignore_not_found(state.segments[pos].delete(key))?;
            }
        }

        state.segments[state.active].write(key, &data)?;

        tracing::trace!(partition = self.id, segment = state.segments[state.active].id(), key, "put");
        Ok(found.map(|_| previous))
    }

    /// Fill `item` from its live copy
    ///
    /// Returns `KeyNotFound` if no segment holds a decodable copy.
    pub fn read<I: Item>(&self, item: &mut I) -> Result<()> {
        let state = self.state.read();
        let key = item.hex_key().to_string();

        match Self::locate(&state.segments, &key, item)? {
            Some(_) => Ok(()),
            None => Err(ShardError::KeyNotFound),
        }
    }

    /// Tombstone `item`'s key in every segment holding it
    ///
    /// Returns the removed value, if one was live.
    pub fn delete<I: Item>(&self, item: &I) -> Result<Option<I>> {
        let state = self.state.write();
        let key = item.hex_key();

        let mut removed = item.clone();
        let found = Self::locate(&state.segments, key, &mut removed)?;

        for segment in &state.segments {
            ignore_not_found(segment.delete(key))?;
        }

        tracing::trace!(partition = self.id, key, found = found.is_some(), "delete");
        Ok(found.map(|_| removed))
    }

    /// Flush buffered writes in every segment
    pub fn flush(&self) -> Result<()> {
        let state = self.state.read();
        for segment in &state.segments {
            segment.flush()?;
        }
        Ok(())
    }

    /// Flush and sync every segment
    pub fn close(&self) -> Result<()> {
        let state = self.state.write();
        for segment in &state.segments {
            segment.close()?;
        }
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Partition id
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Directory holding this partition's files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of segments, sealed and active
    pub fn segment_count(&self) -> usize {
        self.state.read().segments.len()
    }

    /// Id of the segment currently accepting writes
    pub fn active_segment_id(&self) -> u64 {
        let state = self.state.read();
        state.segments[state.active].id()
    }

    /// Ids of all segments, oldest first
    pub fn segment_ids(&self) -> Vec<u64> {
        self.state.read().segments.iter().map(Segment::id).collect()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Find the segment holding a live copy of `key`, newest first
    ///
    /// Decodes the copy into `item`. Records that fail to decode count as misses.
    fn locate<I: Item>(segments: &[Segment], key: &str, item: &mut I) -> Result<Option<usize>> {
        for (pos, segment) in segments.iter().enumerate().rev() {
            let data = match segment.read(key) {
                Ok(data) => data,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };

            match item.decode(&data) {
                Ok(()) => return Ok(Some(pos)),
                Err(e) => {
                    tracing::debug!(segment = segment.id(), key, error = %e, "undecodable record");
                }
            }
        }
        Ok(None)
    }

    /// Create the next segment and make it active
    fn push_segment(dir: &Path, limits: SegmentLimits, state: &mut PartitionState) -> Result<()> {
        let id = state.next_segment_id;
        let segment = Segment::open(dir, id, limits)?;

        state.next_segment_id = id + 1;
        state.segments.push(segment);
        state.active = state.segments.len() - 1;

        tracing::debug!(dir = %dir.display(), segment = id, "segment created");
        Ok(())
    }

    /// Ids that have both a store and an index file, ascending
    fn discover_segments(dir: &Path) -> Result<Vec<u64>> {
        let mut files: BTreeMap<u64, (bool, bool)> = BTreeMap::new();

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if let Some((id, extension)) = Segment::parse_file_name(&path) {
                let seen = files.entry(id).or_default();
                match extension {
                    STORE_EXTENSION => seen.0 = true,
                    INDEX_EXTENSION => seen.1 = true,
                    _ => {}
                }
            }
        }

        let mut ids = Vec::with_capacity(files.len());
        for (id, seen) in files {
            if seen == (true, true) {
                ids.push(id);
            } else {
                tracing::warn!(dir = %dir.display(), segment = id, "ignoring unpaired segment file");
            }
        }
        Ok(ids)
    }
}

/// Treat a not-found result as success
fn ignore_not_found<T>(result: Result<T>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(e),
    }
}
