//! # shardlog
//!
//! An embedded, file-backed document store with:
//! - Attribute-map items addressed by a partition-key attribute
//! - Hash-routed partitions, each a list of append-only segments
//! - Size-triggered segment rotation
//! - Fixed-width on-disk indexes with in-place tombstones
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Database                              │
//! │         (item construction, SHA-256 shard routing)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Partition 1..N                             │
//! │       (RwLock, one active segment, single live copy)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │         Segment         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │    Store    │          │    Index    │
//!   │  (Append)   │◄─────────│ (key → pos) │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! Record payloads are produced by the [`item::codec`] tagged-union codec.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod item;
pub mod storage;
pub mod database;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ShardError, Result};
pub use config::Config;
pub use database::Database;
pub use item::{AttributeMap, AttributeValue, Item, KeyItem, TableItem};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of shardlog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
