//! Table items
//!
//! An attribute map addressed by its partition-key attribute.

use crate::error::{Result, ShardError};

use super::codec;
use super::value::{AttributeMap, AttributeValue};
use super::{now_unix_nano, ContentKey, Item};

/// Attribute map addressed by one designated String attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableItem {
    /// The item's attributes
    pub attributes: AttributeMap,

    /// Write time (unix nanoseconds)
    pub unix_nano: i64,

    key: ContentKey,
}

impl TableItem {
    /// Build an item from `attributes`, keyed by the `partition_key` attribute
    ///
    /// Fails if the attribute is absent or is not a String value.
    pub fn new(attributes: AttributeMap, partition_key: &str) -> Result<Self> {
        let key = Self::derive_key(&attributes, partition_key)?;
        Ok(Self {
            attributes,
            unix_nano: now_unix_nano(),
            key,
        })
    }

    /// Build an empty item that only carries the key of `key_attributes`
    ///
    /// Used as the target of a read; the attributes are filled by `decode`.
    pub fn for_lookup(key_attributes: &AttributeMap, partition_key: &str) -> Result<Self> {
        let key = Self::derive_key(key_attributes, partition_key)?;
        Ok(Self {
            attributes: AttributeMap::new(),
            unix_nano: 0,
            key,
        })
    }

    /// Consume the item, returning its attributes
    pub fn into_attributes(self) -> AttributeMap {
        self.attributes
    }

    fn derive_key(attributes: &AttributeMap, partition_key: &str) -> Result<ContentKey> {
        let value = attributes
            .get(partition_key)
            .ok_or_else(|| ShardError::MissingPartitionKey(partition_key.to_string()))?;

        match value {
            AttributeValue::String(s) => Ok(ContentKey::of(s.as_bytes())),
            _ => Err(ShardError::InvalidPartitionKeyType(partition_key.to_string())),
        }
    }
}

impl Item for TableItem {
    fn content_key(&self) -> &ContentKey {
        &self.key
    }

    fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(codec::TIMESTAMP_SIZE + 64);
        codec::encode_map(&self.attributes, self.unix_nano, &mut buf)?;
        Ok(buf)
    }

    fn decode(&mut self, data: &[u8]) -> Result<()> {
        let (value, unix_nano) = codec::decode_from_slice(data)?;
        match value {
            AttributeValue::Map(attributes) => {
                self.attributes = attributes;
                self.unix_nano = unix_nano;
                Ok(())
            }
            other => Err(ShardError::Codec(format!(
                "expected an attribute map record, got {}",
                other.type_name()
            ))),
        }
    }
}
