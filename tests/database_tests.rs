//! Tests for Database
//!
//! These tests verify:
//! - End-to-end put/get/delete of attribute-map items
//! - Raw-key operations
//! - Partition creation, rediscovery and gap detection on reopen
//! - Shard routing is stable across reopen
//! - Concurrent access through a shared handle

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use shardlog::config::Config;
use shardlog::item::ContentKey;
use shardlog::{AttributeMap, AttributeValue, Database, ShardError, TableItem};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn open_db(path: &Path, partitions: u32) -> Database {
    let config = Config::builder()
        .data_dir(path)
        .partition_count(partitions)
        .partition_key("pk")
        .build();
    Database::open(config).unwrap()
}

fn key(pk: &str) -> AttributeMap {
    let mut map = AttributeMap::new();
    map.insert("pk".to_string(), AttributeValue::string(pk));
    map
}

fn user(pk: &str, name: &str, age: u32) -> AttributeMap {
    let mut map = key(pk);
    map.insert("name".to_string(), AttributeValue::string(name));
    map.insert("age".to_string(), AttributeValue::number(age));
    map
}

// =============================================================================
// Item Tests
// =============================================================================

#[test]
fn test_put_get_delete_item() {
    let temp = TempDir::new().unwrap();
    let db = open_db(temp.path(), 8);

    let item = user("USER#1", "Taro", 20);
    db.put_item(item.clone()).unwrap();

    assert_eq!(db.get_item(&key("USER#1")).unwrap(), Some(item));

    db.delete_item(&key("USER#1")).unwrap();
    assert_eq!(db.get_item(&key("USER#1")).unwrap(), None);
}

#[test]
fn test_get_absent_item() {
    let temp = TempDir::new().unwrap();
    let db = open_db(temp.path(), 8);

    assert_eq!(db.get_item(&key("nobody")).unwrap(), None);
}

#[test]
fn test_delete_absent_item_is_ok() {
    let temp = TempDir::new().unwrap();
    let db = open_db(temp.path(), 8);

    db.delete_item(&key("nobody")).unwrap();
}

#[test]
fn test_put_overwrites_item() {
    let temp = TempDir::new().unwrap();
    let db = open_db(temp.path(), 4);

    db.put_item(user("USER#1", "Taro", 20)).unwrap();
    db.put_item(user("USER#1", "Taro", 21)).unwrap();

    let got = db.get_item(&key("USER#1")).unwrap().unwrap();
    assert_eq!(got.get("age"), Some(&AttributeValue::number(21)));
}

#[test]
fn test_overwrites_survive_rotation() {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp.path())
        .partition_count(2)
        .partition_key("pk")
        .max_store_bytes(64)
        .max_index_bytes(64)
        .build();
    let db = Database::open(config).unwrap();

    for round in 0..8u32 {
        for id in 0..5 {
            db.put_item(user(&format!("USER#{}", id), "n", round)).unwrap();
        }
    }

    for id in 0..5 {
        let got = db.get_item(&key(&format!("USER#{}", id))).unwrap().unwrap();
        assert_eq!(got.get("age"), Some(&AttributeValue::number(7)));
    }
    assert!(db.partitions().iter().any(|p| p.segment_count() > 1));
}

#[test]
fn test_missing_partition_key_attribute() {
    let temp = TempDir::new().unwrap();
    let db = open_db(temp.path(), 8);

    let mut item = AttributeMap::new();
    item.insert("name".to_string(), AttributeValue::string("Taro"));

    assert!(matches!(
        db.put_item(item.clone()),
        Err(ShardError::MissingPartitionKey(_))
    ));
    assert!(matches!(
        db.get_item(&item),
        Err(ShardError::MissingPartitionKey(_))
    ));
}

#[test]
fn test_item_ops_require_configured_partition_key() {
    let temp = TempDir::new().unwrap();
    let db = Database::open_path(temp.path()).unwrap();

    assert!(matches!(
        db.put_item(user("USER#1", "Taro", 20)),
        Err(ShardError::Config(_))
    ));
    // Raw keys don't need one
    db.put_key("plain").unwrap();
}

// =============================================================================
// Raw Key Tests
// =============================================================================

#[test]
fn test_raw_key_operations() {
    let temp = TempDir::new().unwrap();
    let db = open_db(temp.path(), 3);

    db.put_key("session-1").unwrap();
    assert_eq!(db.read_key("session-1").unwrap(), Some("session-1".to_string()));
    assert_eq!(db.read_key("session-2").unwrap(), None);

    db.delete_key("session-1").unwrap();
    assert_eq!(db.read_key("session-1").unwrap(), None);
    db.delete_key("session-1").unwrap();
}

// =============================================================================
// Partition Layout Tests
// =============================================================================

#[test]
fn test_creates_configured_partitions() {
    let temp = TempDir::new().unwrap();
    let db = open_db(temp.path(), 8);

    assert_eq!(db.partition_count(), 8);
    for id in 1..=8 {
        assert!(temp.path().join(id.to_string()).is_dir());
    }
    let ids: Vec<u32> = db.partitions().iter().map(|p| p.id()).collect();
    assert_eq!(ids, (1..=8).collect::<Vec<_>>());
}

#[test]
fn test_default_partition_count() {
    let temp = TempDir::new().unwrap();
    let db = Database::open_path(temp.path()).unwrap();

    assert_eq!(db.partition_count(), 10);
}

#[test]
fn test_reopen_uses_partition_count_from_disk() {
    let temp = TempDir::new().unwrap();
    {
        let db = open_db(temp.path(), 4);
        db.put_item(user("USER#1", "Taro", 20)).unwrap();
        db.close().unwrap();
    }

    let db = open_db(temp.path(), 16);

    assert_eq!(db.partition_count(), 4);
    assert_eq!(
        db.get_item(&key("USER#1")).unwrap(),
        Some(user("USER#1", "Taro", 20))
    );
}

#[test]
fn test_partition_gap_is_fatal() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("1")).unwrap();
    fs::create_dir_all(temp.path().join("3")).unwrap();

    let config = Config::builder()
        .data_dir(temp.path())
        .partition_key("pk")
        .build();
    let result = Database::open(config);

    assert!(matches!(result, Err(ShardError::PartitionGap(2))));
}

#[test]
fn test_non_numeric_entries_are_ignored() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("1")).unwrap();
    fs::create_dir_all(temp.path().join("2")).unwrap();
    fs::create_dir_all(temp.path().join("backup")).unwrap();
    fs::write(temp.path().join("3"), b"a file, not a partition").unwrap();

    let db = open_db(temp.path(), 10);

    assert_eq!(db.partition_count(), 2);
}

#[test]
fn test_non_canonical_partition_names_are_ignored() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("01")).unwrap();
    fs::create_dir_all(temp.path().join("+2")).unwrap();

    let db = open_db(temp.path(), 3);

    // Nothing canonical on disk, so the configured count is created
    assert_eq!(db.partition_count(), 3);
    db.put_item(user("USER#1", "Taro", 20)).unwrap();
    db.close().unwrap();

    let db = open_db(temp.path(), 3);
    assert_eq!(db.partition_count(), 3);
    assert_eq!(
        db.get_item(&key("USER#1")).unwrap(),
        Some(user("USER#1", "Taro", 20))
    );
}

#[test]
fn test_failed_put_keeps_stored_item() {
    let temp = TempDir::new().unwrap();
    let db = open_db(temp.path(), 2);
    db.put_item(user("USER#1", "Taro", 20)).unwrap();

    let oversized = user("USER#1", &"x".repeat(300), 21);
    assert!(matches!(
        db.put_item(oversized),
        Err(ShardError::LengthOverflow { .. })
    ));

    assert_eq!(
        db.get_item(&key("USER#1")).unwrap(),
        Some(user("USER#1", "Taro", 20))
    );
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp.path())
        .partition_count(0)
        .build();

    assert!(matches!(Database::open(config), Err(ShardError::Config(_))));
}

// =============================================================================
// Routing Tests
// =============================================================================

#[test]
fn test_items_land_in_their_shard() {
    let temp = TempDir::new().unwrap();
    let db = open_db(temp.path(), 8);

    let content_key = ContentKey::of(b"USER#1");
    let shard = content_key.shard(8);
    db.put_item(user("USER#1", "Taro", 20)).unwrap();

    assert_eq!(db.partition_for(&content_key).id(), shard);

    let mut lookup = TableItem::for_lookup(&key("USER#1"), "pk").unwrap();
    db.partitions()[(shard - 1) as usize].read(&mut lookup).unwrap();
    for partition in db.partitions().iter().filter(|p| p.id() != shard) {
        assert!(matches!(partition.read(&mut lookup), Err(ShardError::KeyNotFound)));
    }
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_items_persist_across_reopen() {
    let temp = TempDir::new().unwrap();
    {
        let db = open_db(temp.path(), 8);
        for i in 0..50 {
            db.put_item(user(&format!("USER#{}", i), "name", i)).unwrap();
        }
        db.delete_item(&key("USER#7")).unwrap();
        db.close().unwrap();
    }

    let db = open_db(temp.path(), 8);
    for i in 0..50 {
        let got = db.get_item(&key(&format!("USER#{}", i))).unwrap();
        if i == 7 {
            assert_eq!(got, None);
        } else {
            assert_eq!(got, Some(user(&format!("USER#{}", i), "name", i)));
        }
    }
}

#[test]
fn test_flush_makes_items_visible_to_reopen() {
    let temp = TempDir::new().unwrap();
    let db = open_db(temp.path(), 2);
    db.put_item(user("USER#1", "Taro", 20)).unwrap();
    db.flush().unwrap();

    let other = open_db(temp.path(), 2);
    assert_eq!(
        other.get_item(&key("USER#1")).unwrap(),
        Some(user("USER#1", "Taro", 20))
    );
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers_and_readers() {
    let temp = TempDir::new().unwrap();
    let db = Arc::new(open_db(temp.path(), 4));

    let mut handles = Vec::new();
    for t in 0..4u32 {
        let db = Arc::clone(&db);
        handles.push(thread::spawn(move || {
            for i in 0..25u32 {
                let pk = format!("T{}#{}", t, i);
                db.put_item(user(&pk, "worker", i)).unwrap();
                assert_eq!(db.get_item(&key(&pk)).unwrap(), Some(user(&pk, "worker", i)));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    for t in 0..4u32 {
        for i in 0..25u32 {
            let pk = format!("T{}#{}", t, i);
            assert_eq!(db.get_item(&key(&pk)).unwrap(), Some(user(&pk, "worker", i)));
        }
    }
}
