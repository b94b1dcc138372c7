//! Error types for shardlog
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using ShardError
pub type Result<T> = std::result::Result<T, ShardError>;

/// Unified error type for shardlog operations
#[derive(Debug, Error)]
pub enum ShardError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    KeyNotFound,

    #[error("Index is empty")]
    EmptyIndex,

    #[error("Invalid index key: {0}")]
    InvalidKey(String),

    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    // -------------------------------------------------------------------------
    // Item Validation Errors
    // -------------------------------------------------------------------------
    #[error("Partition key attribute '{0}' not found in item")]
    MissingPartitionKey(String),

    #[error("Partition key attribute '{0}' must be a string")]
    InvalidPartitionKeyType(String),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Unknown attribute type tag: 0x{0:02x}")]
    UnknownTypeTag(u8),

    #[error("{what} length {len} exceeds the 255 limit")]
    LengthOverflow { what: &'static str, len: usize },

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Startup / Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Partition {0} is missing; partition directories must be numbered 1..N")]
    PartitionGap(u32),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ShardError {
    /// True for the normal-miss errors (absent key or a brand-new index)
    pub fn is_not_found(&self) -> bool {
        matches!(self, ShardError::KeyNotFound | ShardError::EmptyIndex)
    }
}
