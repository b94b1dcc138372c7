//! Configuration for shardlog
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, ShardError};

/// Default number of partitions created for a fresh database
pub const DEFAULT_PARTITION_COUNT: u32 = 10;

/// Default per-segment limit for both the store and the index file
pub const DEFAULT_SEGMENT_MAX_BYTES: u64 = 1024;

/// Main configuration for a shardlog database
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── 1/                 (partition 1)
    ///     │    ├── 1.store       (record log)
    ///     │    └── 1.index       (key → position directory)
    ///     └── 2/ ...
    pub data_dir: PathBuf,

    /// Number of partitions created on first open.
    /// Ignored once numbered partition directories exist.
    pub partition_count: u32,

    // -------------------------------------------------------------------------
    // Segment Configuration
    // -------------------------------------------------------------------------
    /// Size limits that seal a segment
    pub segment: SegmentLimits,

    // -------------------------------------------------------------------------
    // Table Configuration
    // -------------------------------------------------------------------------
    /// Attribute that addresses table items
    pub partition_key: Option<String>,
}

/// Thresholds after which a segment stops accepting writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentLimits {
    /// Max size of the record log (in bytes)
    pub max_store_bytes: u64,

    /// Max size of the index file (in bytes)
    pub max_index_bytes: u64,
}

impl Default for SegmentLimits {
    fn default() -> Self {
        Self {
            max_store_bytes: DEFAULT_SEGMENT_MAX_BYTES,
            max_index_bytes: DEFAULT_SEGMENT_MAX_BYTES,
        }
    }
}

impl SegmentLimits {
    /// Replace zero limits with the defaults
    pub fn or_default(self) -> Self {
        Self {
            max_store_bytes: if self.max_store_bytes == 0 {
                DEFAULT_SEGMENT_MAX_BYTES
            } else {
                self.max_store_bytes
            },
            max_index_bytes: if self.max_index_bytes == 0 {
                DEFAULT_SEGMENT_MAX_BYTES
            } else {
                self.max_index_bytes
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./shardlog_data"),
            partition_count: DEFAULT_PARTITION_COUNT,
            segment: SegmentLimits::default(),
            partition_key: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the configuration for values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.partition_count == 0 {
            return Err(ShardError::Config(
                "partition_count must be at least 1".to_string(),
            ));
        }
        if self.segment.max_store_bytes == 0 || self.segment.max_index_bytes == 0 {
            return Err(ShardError::Config(
                "segment limits must be non-zero".to_string(),
            ));
        }
        if matches!(self.partition_key.as_deref(), Some("")) {
            return Err(ShardError::Config(
                "partition_key must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all partitions)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the partition count used on first creation
    pub fn partition_count(mut self, count: u32) -> Self {
        self.config.partition_count = count;
        self
    }

    /// Set the max store bytes per segment
    pub fn max_store_bytes(mut self, bytes: u64) -> Self {
        self.config.segment.max_store_bytes = bytes;
        self
    }

    /// Set the max index bytes per segment
    pub fn max_index_bytes(mut self, bytes: u64) -> Self {
        self.config.segment.max_index_bytes = bytes;
        self
    }

    /// Set the partition-key attribute name
    pub fn partition_key(mut self, name: impl Into<String>) -> Self {
        self.config.partition_key = Some(name.into());
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
