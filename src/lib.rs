//! # shardcmap
//!
//! A sharded concurrent map with string keys.
//!
//! The map is split into a fixed number of shards, each a hash map behind its
//! own read-write lock. A key is routed to its shard with a 32-bit FNV hash,
//! so single-key operations on different shards never contend. Whole-map
//! operations (`len`, `clear`, `keys`, `items`, JSON export) visit one shard
//! lock at a time and are only exact when no writers are running.
//!
//! ## Features
//!
//! - **Sharded locking**: one `RwLock` per shard, never more than one held at a time
//! - **Atomic per-key callbacks**: `upsert` and `remove_cb` run under the shard's write lock
//! - **Snapshot iteration**: shards are captured in parallel and merged into one lazy sequence
//! - **Shared values**: values are stored as `Arc<V>`, so reads never copy them
//! - **Deterministic**: Same key always maps to the same shard
//! - **JSON**: `serde` support, with `serde_json` doing the encoding
//!
//! ## Example
//!
//! ```rust
//! use shardcmap::ShardMap;
//!
//! let map = ShardMap::new();
//!
//! map.set("a", 1);
//! map.set("b", 2);
//!
//! // Update under the shard lock
//! let stored = map.upsert("a", 10, |old, new| old.copied().unwrap_or(0) + new);
//! assert_eq!(*stored, 11);
//!
//! // Conditional delete
//! assert!(map.remove_cb("b", |_, value| value == Some(&2)));
//! assert!(!map.has("b"));
//!
//! // Iterate over a snapshot
//! for (key, value) in map.iter_snapshot() {
//!     println!("{}: {}", key, *value);
//! }
//!
//! assert_eq!(map.to_json()?, r#"{"a":11}"#);
//! # Ok::<(), shardcmap::Error>(())
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use shardcmap::{ShardMapBuilder, HashFunction};
//!
//! let map = ShardMapBuilder::new()
//!     .shard_count(64)?
//!     .hash_function(HashFunction::AHash)
//!     .build::<i32>()?;
//! # Ok::<(), shardcmap::Error>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

/// Configuration and builder types.
pub mod config;
/// Error types.
pub mod error;
/// Shard routing hashes.
pub mod hash;
/// Snapshot/merge iteration.
pub mod iter;
/// JSON import and export.
pub mod json;
/// Internal shard implementation.
mod shard;
/// Main ShardMap implementation.
pub mod shardmap;
/// Statistics and metrics collection.
pub mod stats;

// Re-export main types
pub use config::{Config, HashFunction, RoutingConfig, ShardMapBuilder, ShardRouter};
pub use error::Error;
pub use iter::{Entry, SnapshotIter};
pub use json::ValueMap;
pub use shardmap::ShardMap;
pub use stats::{Diagnostics, ShardDiagnostics, ShardOps, Stats};
