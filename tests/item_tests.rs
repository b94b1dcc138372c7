//! Tests for items
//!
//! These tests verify:
//! - Table items require a String partition-key attribute
//! - Content keys depend only on the partition-key value
//! - Raw-key and table item payloads decode back in place

use shardlog::item::{codec, ContentKey};
use shardlog::{AttributeMap, AttributeValue, Item, KeyItem, ShardError, TableItem};

// =============================================================================
// Helper Functions
// =============================================================================

fn user(pk: &str, name: &str) -> AttributeMap {
    let mut attrs = AttributeMap::new();
    attrs.insert("pk".to_string(), AttributeValue::string(pk));
    attrs.insert("name".to_string(), AttributeValue::string(name));
    attrs.insert("age".to_string(), AttributeValue::number(20));
    attrs
}

// =============================================================================
// Table Item Tests
// =============================================================================

#[test]
fn test_missing_partition_key() {
    let result = TableItem::new(user("USER#1", "Taro"), "id");

    match result {
        Err(ShardError::MissingPartitionKey(name)) => assert_eq!(name, "id"),
        other => panic!("expected MissingPartitionKey, got {:?}", other),
    }
}

#[test]
fn test_non_string_partition_key() {
    let mut attrs = user("USER#1", "Taro");
    attrs.insert("pk".to_string(), AttributeValue::number(1));

    assert!(matches!(
        TableItem::new(attrs.clone(), "pk"),
        Err(ShardError::InvalidPartitionKeyType(_))
    ));
    assert!(matches!(
        TableItem::for_lookup(&attrs, "pk"),
        Err(ShardError::InvalidPartitionKeyType(_))
    ));
}

#[test]
fn test_key_depends_only_on_partition_key_value() {
    let a = TableItem::new(user("USER#1", "Taro"), "pk").unwrap();
    let b = TableItem::new(user("USER#1", "Hanako"), "pk").unwrap();
    let c = TableItem::new(user("USER#2", "Taro"), "pk").unwrap();

    assert_eq!(a.content_key(), b.content_key());
    assert_ne!(a.content_key(), c.content_key());
    assert_eq!(a.content_key(), &ContentKey::of(b"USER#1"));
}

#[test]
fn test_table_and_key_items_share_addressing() {
    let table = TableItem::new(user("USER#1", "Taro"), "pk").unwrap();
    let raw = KeyItem::new("USER#1");

    assert_eq!(table.hex_key(), raw.hex_key());
}

#[test]
fn test_lookup_item_is_empty() {
    let lookup = TableItem::for_lookup(&user("USER#1", "Taro"), "pk").unwrap();

    assert!(lookup.attributes.is_empty());
    assert_eq!(lookup.unix_nano, 0);
}

#[test]
fn test_table_item_decodes_in_place() {
    let written = TableItem::new(user("USER#1", "Taro"), "pk").unwrap();
    let payload = written.encode().unwrap();

    let mut read = TableItem::for_lookup(&user("USER#1", ""), "pk").unwrap();
    read.decode(&payload).unwrap();

    assert_eq!(read, written);
    assert_eq!(read.into_attributes(), user("USER#1", "Taro"));
}

#[test]
fn test_table_item_rejects_non_map_payload() {
    let payload = codec::encode_to_vec(&AttributeValue::string("not a map"), 1).unwrap();
    let mut item = TableItem::for_lookup(&user("USER#1", ""), "pk").unwrap();

    assert!(matches!(item.decode(&payload), Err(ShardError::Codec(_))));
}

#[test]
fn test_oversized_item_fails_to_encode() {
    let mut attrs = user("USER#1", "Taro");
    attrs.insert("bio".to_string(), AttributeValue::string("x".repeat(300)));
    let item = TableItem::new(attrs, "pk").unwrap();

    assert!(matches!(
        item.encode(),
        Err(ShardError::LengthOverflow { .. })
    ));
}

// =============================================================================
// Key Item Tests
// =============================================================================

#[test]
fn test_key_item_decodes_in_place() {
    let written = KeyItem::new("session-42");
    let payload = written.encode().unwrap();

    let mut read = KeyItem::new("");
    read.decode(&payload).unwrap();

    assert_eq!(read.raw_key, "session-42");
    assert_eq!(read.unix_nano, written.unix_nano);
}

#[test]
fn test_key_item_rejects_garbage() {
    let mut item = KeyItem::new("k");

    assert!(matches!(
        item.decode(&[1, 2, 3]),
        Err(ShardError::Serialization(_))
    ));
}

#[test]
fn test_key_item_timestamp_is_set() {
    assert!(KeyItem::new("k").unix_nano > 0);
}
