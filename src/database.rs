//! Database Module
//!
//! The top-level handle that owns all partitions.
//!
//! ## Responsibilities
//! - Create or rediscover numbered partition directories
//! - Turn attribute maps and raw keys into items
//! - Route each item to its partition by content key
//! - Report misses as absent results rather than errors

use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::{Result, ShardError};
use crate::item::{AttributeMap, ContentKey, Item, KeyItem, TableItem};
use crate::storage::Partition;

/// The main database handle
///
/// ## Concurrency Model
///
/// - `Database` is `Send + Sync`; share it through `Arc`
/// - Each partition has its own RwLock, so operations on different
///   partitions never contend
/// - Items are built per call and never shared
pub struct Database {
    /// Database configuration
    config: Config,

    /// Partitions; partition `n` lives at `partitions[n - 1]`
    partitions: Vec<Partition>,
}

impl Database {
    /// Open or create a database with the given config
    ///
    /// On startup:
    /// 1. Create the data directory if it doesn't exist
    /// 2. Open every numbered partition directory found
    /// 3. Require the found ids to be exactly 1..N
    /// 4. With no partitions on disk, create `config.partition_count`
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let mut existing = Self::discover_partitions(&config.data_dir)?;
        existing.sort_unstable();

        let count = if existing.is_empty() {
            config.partition_count
        } else {
            let count = existing.len() as u32;
            // Sorted and unique, so any hole shows up as a mismatch
            if let Some(missing) = (1..=count).zip(&existing).find(|(want, got)| want != *got) {
                return Err(ShardError::PartitionGap(missing.0));
            }
            if count != config.partition_count {
                tracing::debug!(
                    configured = config.partition_count,
                    found = count,
                    "using partition count from disk"
                );
            }
            count
        };

        let mut partitions = Vec::with_capacity(count as usize);
        for id in 1..=count {
            partitions.push(Partition::open(&config.data_dir, id, config.segment)?);
        }

        tracing::info!(
            data_dir = %config.data_dir.display(),
            partitions = count,
            "database opened"
        );

        Ok(Self { config, partitions })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    // =========================================================================
    // Table Items
    // =========================================================================

    /// Store an attribute map under its partition key
    pub fn put_item(&self, attributes: AttributeMap) -> Result<()> {
        let item = TableItem::new(attributes, self.partition_key()?)?;
        self.partition_for(item.content_key()).put(&item)?;
        Ok(())
    }

    /// Fetch the item addressed by `key`
    ///
    /// Only the partition-key attribute of `key` is used. Returns `None` if absent.
    pub fn get_item(&self, key: &AttributeMap) -> Result<Option<AttributeMap>> {
        let mut item = TableItem::for_lookup(key, self.partition_key()?)?;
        match self.partition_for(item.content_key()).read(&mut item) {
            Ok(()) => Ok(Some(item.into_attributes())),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Delete the item addressed by `key`; deleting an absent item is not an error
    pub fn delete_item(&self, key: &AttributeMap) -> Result<()> {
        let item = TableItem::for_lookup(key, self.partition_key()?)?;
        self.partition_for(item.content_key()).delete(&item)?;
        Ok(())
    }

    // =========================================================================
    // Raw Keys
    // =========================================================================

    /// Store a raw key
    pub fn put_key(&self, key: &str) -> Result<()> {
        let item = KeyItem::new(key);
        self.partition_for(item.content_key()).put(&item)?;
        Ok(())
    }

    /// Read a raw key back; `None` if absent
    pub fn read_key(&self, key: &str) -> Result<Option<String>> {
        let mut item = KeyItem::new(key);
        match self.partition_for(item.content_key()).read(&mut item) {
            Ok(()) => Ok(Some(item.raw_key)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Delete a raw key; deleting an absent key is not an error
    pub fn delete_key(&self, key: &str) -> Result<()> {
        let item = KeyItem::new(key);
        self.partition_for(item.content_key()).delete(&item)?;
        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Flush buffered writes in every partition
    pub fn flush(&self) -> Result<()> {
        for partition in &self.partitions {
            partition.flush()?;
        }
        Ok(())
    }

    /// Close the database gracefully
    ///
    /// Flushes and syncs every segment
    pub fn close(self) -> Result<()> {
        for partition in &self.partitions {
            partition.close()?;
        }
        tracing::debug!(data_dir = %self.config.data_dir.display(), "database closed");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// The partition responsible for `key`
    pub fn partition_for(&self, key: &ContentKey) -> &Partition {
        let id = key.shard(self.partitions.len() as u32);
        tracing::trace!(key = key.as_hex(), partition = id, "routed");
        &self.partitions[(id - 1) as usize]
    }

    /// All partitions, ordered by id
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// Number of partitions
    pub fn partition_count(&self) -> u32 {
        self.partitions.len() as u32
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn partition_key(&self) -> Result<&str> {
        self.config.partition_key.as_deref().ok_or_else(|| {
            ShardError::Config("partition_key is required for item operations".to_string())
        })
    }

    /// Ids of numbered subdirectories ("1", "2", ...)
    ///
    /// Only canonical names count; "01" or "+1" would never be reopened
    /// under the same path.
    fn discover_partitions(dir: &Path) -> Result<Vec<u32>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            match name.parse::<u32>() {
                Ok(id) if id > 0 && id.to_string() == name => ids.push(id),
                _ => {
                    tracing::debug!(dir = %dir.display(), entry = name, "skipping non-partition directory");
                }
            }
        }
        Ok(ids)
    }
}
