//! Storage Module
//!
//! Persistent storage layer built from append-only segments.
//!
//! ## Responsibilities
//! - Append record payloads to size-bounded segments
//! - Map content keys to record positions, with write history
//! - Tombstone deleted keys in place
//! - Rotate segments and route keys within a partition
//!
//! ## Directory Layout
//! ```text
//! {data_dir}/{partition_id}/{segment_id}.store
//! {data_dir}/{partition_id}/{segment_id}.index
//! ```
//!
//! ## Store Format
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Record                                 │
//! │ ┌──────────────┬─────────────────────┐ │
//! │ │ Len: u64 BE  │ Payload (Len bytes) │ │
//! │ └──────────────┴─────────────────────┘ │
//! │ ... (repeated, position = offset of    │
//! │      the length prefix)                │
//! └────────────────────────────────────────┘
//! ```
//!
//! ## Index Format
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Entry (72 bytes)                       │
//! │ ┌──────────────────┬─────────────────┐ │
//! │ │ Key (64, hex)    │ Position: u64 BE│ │
//! │ └──────────────────┴─────────────────┘ │
//! │ ... (repeated; a zeroed key slot is a  │
//! │      tombstone)                        │
//! └────────────────────────────────────────┘
//! ```

mod index;
mod partition;
mod segment;
mod store;

pub use index::{Index, ENTRY_WIDTH, KEY_WIDTH, POS_WIDTH};
pub use partition::Partition;
pub use segment::{Segment, INDEX_EXTENSION, STORE_EXTENSION};
pub use store::{Store, LEN_WIDTH};
