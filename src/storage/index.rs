//! Index
//!
//! Fixed-width directory from content keys to store positions.
//!
//! Every write appends a new `[key (64)][position (8)]` entry, so the file
//! keeps the full write history of a key. Deleting a key zero-fills the key
//! slot of each of its entries; a zeroed slot is skipped on rebuild.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{Result, ShardError};

/// Width of the key slot (hex form of a SHA-256 digest)
pub const KEY_WIDTH: u64 = 64;

/// Width of the position slot
pub const POS_WIDTH: u64 = 8;

/// Width of one index entry
pub const ENTRY_WIDTH: u64 = KEY_WIDTH + POS_WIDTH;

const BLANK_KEY: [u8; KEY_WIDTH as usize] = [0u8; KEY_WIDTH as usize];

/// Positions recorded for one key
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    /// Written once
    Single(u64),

    /// Written more than once, in write order
    History(Vec<u64>),
}

impl Slot {
    fn latest(&self) -> u64 {
        match self {
            Slot::Single(pos) => *pos,
            // History always holds at least two positions
            Slot::History(all) => all[all.len() - 1],
        }
    }

    fn into_positions(self) -> Vec<u64> {
        match self {
            Slot::Single(pos) => vec![pos],
            Slot::History(all) => all,
        }
    }
}

/// On-disk key → position directory with an in-memory mirror
pub struct Index {
    /// Path of the backing file
    path: PathBuf,

    /// Maps, writer and size, guarded together
    inner: Mutex<IndexInner>,
}

struct IndexInner {
    /// Buffered handle; its cursor sits at end of file between calls
    file: BufWriter<File>,

    /// Live keys
    slots: HashMap<String, Slot>,

    /// Bytes in the file, buffered entries and tombstones included
    size: u64,

    /// Most recently written key, target of empty-key calls
    latest_key: Option<String>,
}

impl Index {
    /// Open or create an index file, rebuilding the in-memory maps
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        let size = file.metadata()?.len();

        if size % ENTRY_WIDTH != 0 {
            return Err(ShardError::CorruptIndex(format!(
                "{}: length {} is not a multiple of {}",
                path.display(),
                size,
                ENTRY_WIDTH
            )));
        }

        let mut data = Vec::with_capacity(size as usize);
        file.read_to_end(&mut data)?;
        file.seek(SeekFrom::End(0))?;

        let mut inner = IndexInner {
            file: BufWriter::new(file),
            slots: HashMap::with_capacity((size / ENTRY_WIDTH) as usize),
            size,
            latest_key: None,
        };
        inner.rebuild(&data)?;

        tracing::debug!(
            path = %path.display(),
            entries = size / ENTRY_WIDTH,
            live_keys = inner.slots.len(),
            "index opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(inner),
        })
    }

    /// Latest position recorded for `key`
    ///
    /// An empty key reads the most recently written key.
    pub fn read(&self, key: &str) -> Result<u64> {
        let inner = self.inner.lock();
        if inner.size == 0 {
            return Err(ShardError::EmptyIndex);
        }

        let key = inner.resolve(key)?;
        inner
            .slots
            .get(&key)
            .map(Slot::latest)
            .ok_or(ShardError::KeyNotFound)
    }

    /// Record `pos` for `key`
    ///
    /// Earlier entries for the same key stay on disk; the key keeps its history.
    pub fn write(&self, key: &str, pos: u64) -> Result<()> {
        let mut inner = self.inner.lock();
        let key = inner.resolve(key)?;
        validate_key(&key)?;

        inner.file.write_all(key.as_bytes())?;
        inner.file.write_all(&pos.to_be_bytes())?;
        inner.size += ENTRY_WIDTH;
        inner.record(key.clone(), pos);
        inner.latest_key = Some(key);

        Ok(())
    }

    /// Remove `key` and tombstone all of its entries on disk
    ///
    /// Returns every position recorded for the key, in write order.
    pub fn delete(&self, key: &str) -> Result<Vec<u64>> {
        let mut inner = self.inner.lock();
        if inner.size == 0 {
            return Err(ShardError::EmptyIndex);
        }

        let key = inner.resolve(key)?;
        let slot = inner.slots.remove(&key).ok_or(ShardError::KeyNotFound)?;
        if inner.latest_key.as_deref() == Some(key.as_str()) {
            inner.latest_key = None;
        }

        inner.file.flush()?;
        let tombstoned = inner.tombstone(key.as_bytes())?;

        tracing::trace!(path = %self.path.display(), key = %key, tombstoned, "index key deleted");

        Ok(slot.into_positions())
    }

    /// Flush buffered entries to the file
    pub fn flush(&self) -> Result<()> {
        self.inner.lock().file.flush()?;
        Ok(())
    }

    /// Flush and sync the file to disk
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.file.flush()?;
        inner.file.get_ref().sync_all()?;
        Ok(())
    }

    /// Bytes in the index file, tombstoned entries included
    pub fn size(&self) -> u64 {
        self.inner.lock().size
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.inner.lock().slots.len()
    }

    /// True when no live keys remain
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IndexInner {
    /// Map an empty key to the latest written key
    fn resolve(&self, key: &str) -> Result<String> {
        if !key.is_empty() {
            return Ok(key.to_string());
        }
        self.latest_key.clone().ok_or(ShardError::KeyNotFound)
    }

    fn record(&mut self, key: String, pos: u64) {
        match self.slots.entry(key) {
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::Single(pos));
            }
            Entry::Occupied(mut occupied) => {
                let slot = occupied.get_mut();
                match *slot {
                    Slot::History(ref mut all) => all.push(pos),
                    Slot::Single(first) => *slot = Slot::History(vec![first, pos]),
                }
            }
        }
    }

    /// Replay entries in file order, skipping tombstones
    fn rebuild(&mut self, data: &[u8]) -> Result<()> {
        for entry in data.chunks_exact(ENTRY_WIDTH as usize) {
            let (key, pos) = entry.split_at(KEY_WIDTH as usize);
            if key == &BLANK_KEY[..] {
                continue;
            }

            let key = std::str::from_utf8(key)
                .map_err(|e| ShardError::CorruptIndex(format!("key slot is not UTF-8: {}", e)))?
                .to_string();
            let mut buf = [0u8; POS_WIDTH as usize];
            buf.copy_from_slice(pos);

            self.record(key.clone(), u64::from_be_bytes(buf));
            self.latest_key = Some(key);
        }
        Ok(())
    }

    /// Zero the key slot of every entry matching `key`
    ///
    /// The buffer must be flushed. Leaves the cursor at end of file.
    fn tombstone(&mut self, key: &[u8]) -> Result<usize> {
        let file = self.file.get_mut();

        let mut data = Vec::with_capacity(self.size as usize);
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut data)?;

        let mut count = 0;
        for (i, entry) in data.chunks_exact(ENTRY_WIDTH as usize).enumerate() {
            if &entry[..KEY_WIDTH as usize] != key {
                continue;
            }
            file.seek(SeekFrom::Start(i as u64 * ENTRY_WIDTH))?;
            file.write_all(&BLANK_KEY)?;
            count += 1;
        }

        file.seek(SeekFrom::End(0))?;
        Ok(count)
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.len() as u64 != KEY_WIDTH {
        return Err(ShardError::InvalidKey(format!(
            "expected {} bytes, got {}",
            KEY_WIDTH,
            key.len()
        )));
    }
    if key.as_bytes() == &BLANK_KEY[..] {
        return Err(ShardError::InvalidKey("key slot may not be all zero".to_string()));
    }
    Ok(())
}
