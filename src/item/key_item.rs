//! Raw-key items
//!
//! An item addressed directly by a key string. The payload records the key
//! and the time it was written.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShardError};

use super::{now_unix_nano, ContentKey, Item};

/// Item addressed by a raw key string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyItem {
    /// The key as supplied by the caller
    pub raw_key: String,

    /// Write time (unix nanoseconds)
    pub unix_nano: i64,

    key: ContentKey,
}

/// On-disk payload of a KeyItem
#[derive(Serialize, Deserialize)]
struct KeyRecord {
    raw_key: String,
    unix_nano: i64,
}

impl KeyItem {
    /// Create an item for `raw_key`, stamped with the current time
    pub fn new(raw_key: impl Into<String>) -> Self {
        let raw_key = raw_key.into();
        Self {
            key: ContentKey::of(raw_key.as_bytes()),
            unix_nano: now_unix_nano(),
            raw_key,
        }
    }
}

impl Item for KeyItem {
    fn content_key(&self) -> &ContentKey {
        &self.key
    }

    fn encode(&self) -> Result<Vec<u8>> {
        let record = KeyRecord {
            raw_key: self.raw_key.clone(),
            unix_nano: self.unix_nano,
        };
        bincode::serialize(&record).map_err(|e| ShardError::Serialization(e.to_string()))
    }

    fn decode(&mut self, data: &[u8]) -> Result<()> {
        let record: KeyRecord =
            bincode::deserialize(data).map_err(|e| ShardError::Serialization(e.to_string()))?;
        self.raw_key = record.raw_key;
        self.unix_nano = record.unix_nano;
        Ok(())
    }
}
