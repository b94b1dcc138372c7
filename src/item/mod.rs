//! Item Module
//!
//! Items are the unit the partitions store: something that can name its own
//! content key and turn itself into (and back from) a record payload.
//!
//! ## Responsibilities
//! - Derive the 256-bit content key that addresses an item
//! - Serialize items into record payloads and back
//! - Define the attribute value model and its binary codec
//!
//! ## Item Shapes
//! - [`KeyItem`]: addressed by a raw key string, payload is the key plus a timestamp
//! - [`TableItem`]: addressed by the partition-key attribute of an attribute map

pub mod codec;
mod key_item;
mod table_item;
mod value;

use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

use crate::error::Result;

pub use key_item::KeyItem;
pub use table_item::TableItem;
pub use value::{AttributeMap, AttributeValue};

/// Width of a content key digest in bytes
pub const CONTENT_KEY_SIZE: usize = 32;

/// Something a partition can store
///
/// `decode` fills the item in place from a payload produced by `encode`.
pub trait Item: Clone {
    /// The item's content key
    fn content_key(&self) -> &ContentKey;

    /// Textual form of the content key (index key slot)
    fn hex_key(&self) -> &str {
        self.content_key().as_hex()
    }

    /// Serialize the item into a record payload
    fn encode(&self) -> Result<Vec<u8>>;

    /// Populate the item from a record payload
    fn decode(&mut self, data: &[u8]) -> Result<()>;
}

/// SHA-256 digest of a key string, with its hex form precomputed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentKey {
    digest: [u8; CONTENT_KEY_SIZE],
    hex: String,
}

impl ContentKey {
    /// Hash raw key bytes into a content key
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let digest: [u8; CONTENT_KEY_SIZE] = hasher.finalize().into();
        Self {
            hex: hex::encode(digest),
            digest,
        }
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; CONTENT_KEY_SIZE] {
        &self.digest
    }

    /// 64-character lowercase hex form
    pub fn as_hex(&self) -> &str {
        &self.hex
    }

    /// Route this key to a shard numbered 1..=partition_count
    ///
    /// Uses the big-endian u32 of the first 4 digest bytes.
    pub fn shard(&self, partition_count: u32) -> u32 {
        let head = u32::from_be_bytes([self.digest[0], self.digest[1], self.digest[2], self.digest[3]]);
        head % partition_count + 1
    }
}

/// Current wall-clock time in unix nanoseconds
pub(crate) fn now_unix_nano() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or_default()
}
