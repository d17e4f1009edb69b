//! Per-shard operation counters and load diagnostics.
//!
//! Counters are only collected with the `metrics` feature (lock wait time
//! additionally needs `lock-timing`). Without it every counter reads as zero
//! and recording compiles to nothing; entry counts are always available.

use serde::Serialize;
#[cfg(feature = "metrics")]
use std::sync::atomic::{AtomicU64, Ordering};

/// Something a shard did, as seen by its counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    /// `get` that found the key.
    Hit,
    /// `get` that missed.
    Miss,
    /// Unconditional store (`set`, `try_set_for`).
    Set,
    /// `set_if_absent` that stored its value.
    Inserted,
    /// `set_if_absent` that found the key already present.
    Rejected,
    /// `upsert` callback run and stored.
    Upsert,
    /// Entry deleted by `remove`, `pop` or `remove_cb`.
    Remove,
}

/// Operation counters of one shard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ShardOps {
    /// Lookups that found their key.
    pub hits: u64,
    /// Lookups that did not.
    pub misses: u64,
    /// Unconditional stores.
    pub sets: u64,
    /// `set_if_absent` calls that stored their value.
    pub inserted_if_absent: u64,
    /// `set_if_absent` calls that lost to an existing entry.
    pub rejected_if_absent: u64,
    /// `upsert` calls.
    pub upserts: u64,
    /// Entries deleted.
    pub removes: u64,
    /// Entries copied out by snapshots.
    pub snapshot_entries: u64,
    /// Lock acquisitions, read or write.
    pub lock_acquisitions: u64,
    /// Cumulative lock wait in nanoseconds (needs `lock-timing`).
    pub lock_wait_nanos: u64,
}

impl ShardOps {
    /// Every keyed operation that touched this shard.
    pub fn total(&self) -> u64 {
        self.hits
            + self.misses
            + self.sets
            + self.inserted_if_absent
            + self.rejected_if_absent
            + self.upserts
            + self.removes
    }
}

#[cfg(feature = "metrics")]
#[derive(Default)]
pub(crate) struct ShardStats {
    counters: [AtomicU64; 7],
    snapshot_entries: AtomicU64,
    lock_acquisitions: AtomicU64,
    #[cfg(feature = "lock-timing")]
    lock_wait_nanos: AtomicU64,
}

#[cfg(feature = "metrics")]
impl ShardStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record(&self, op: Op) {
        self.counters[op as usize].fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_snapshot(&self, entries: usize) {
        self.snapshot_entries
            .fetch_add(entries as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_lock_acquisition(&self) {
        self.lock_acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    #[cfg(feature = "lock-timing")]
    #[inline]
    pub fn record_lock_wait(&self, nanos: u64) {
        self.lock_wait_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ShardOps {
        let count = |op: Op| self.counters[op as usize].load(Ordering::Relaxed);
        ShardOps {
            hits: count(Op::Hit),
            misses: count(Op::Miss),
            sets: count(Op::Set),
            inserted_if_absent: count(Op::Inserted),
            rejected_if_absent: count(Op::Rejected),
            upserts: count(Op::Upsert),
            removes: count(Op::Remove),
            snapshot_entries: self.snapshot_entries.load(Ordering::Relaxed),
            lock_acquisitions: self.lock_acquisitions.load(Ordering::Relaxed),
            #[cfg(feature = "lock-timing")]
            lock_wait_nanos: self.lock_wait_nanos.load(Ordering::Relaxed),
            #[cfg(not(feature = "lock-timing"))]
            lock_wait_nanos: 0,
        }
    }
}

#[cfg(not(feature = "metrics"))]
pub(crate) struct ShardStats;

#[cfg(not(feature = "metrics"))]
impl ShardStats {
    pub fn new() -> Self {
        ShardStats
    }

    #[inline]
    pub fn record(&self, _op: Op) {}

    #[inline]
    pub fn record_snapshot(&self, _entries: usize) {}

    #[inline]
    pub fn record_lock_acquisition(&self) {}

    pub fn snapshot(&self) -> ShardOps {
        ShardOps::default()
    }
}

/// Entry counts and counters for the whole map.
///
/// Collected one shard at a time, so only exact on a quiescent map.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    /// Total number of entries across all shards.
    pub size: usize,
    /// Number of entries in each shard.
    pub shard_sizes: Vec<usize>,
    /// Counters of each shard.
    pub operations: Vec<ShardOps>,
}

/// Load and counters of one shard.
#[derive(Debug, Clone, Serialize)]
pub struct ShardDiagnostics {
    /// Number of entries in this shard.
    pub entries: usize,
    /// This shard's share of all entries, in `[0, 1]`.
    pub share: f64,
    /// Operation counters.
    pub ops: ShardOps,
}

/// Load-balance summary of a map.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    /// Total number of entries across all shards.
    pub total_entries: usize,
    /// Per-shard diagnostics.
    pub shards: Vec<ShardDiagnostics>,
    /// Keyed operations over all shards (0 without `metrics`).
    pub total_operations: u64,
    /// Average entries per shard.
    pub avg_load_per_shard: f64,
    /// Busiest shard's load over the average. 1.0 is perfectly even.
    pub max_load_ratio: f64,
    /// Index of the shard holding the most entries.
    pub hottest_shard: usize,
}

impl Diagnostics {
    pub(crate) fn from_shards(loads: Vec<usize>, operations: Vec<ShardOps>) -> Self {
        let total_entries: usize = loads.iter().sum();
        let total_operations = operations.iter().map(ShardOps::total).sum();
        let avg_load_per_shard = if loads.is_empty() {
            0.0
        } else {
            total_entries as f64 / loads.len() as f64
        };
        let (hottest_shard, max_load) = loads
            .iter()
            .copied()
            .enumerate()
            .max_by_key(|&(_, load)| load)
            .unwrap_or((0, 0));
        let max_load_ratio = if avg_load_per_shard > 0.0 {
            max_load as f64 / avg_load_per_shard
        } else {
            0.0
        };

        let shards = loads
            .into_iter()
            .zip(operations)
            .map(|(entries, ops)| ShardDiagnostics {
                entries,
                share: if total_entries == 0 {
                    0.0
                } else {
                    entries as f64 / total_entries as f64
                },
                ops,
            })
            .collect();

        Self {
            total_entries,
            shards,
            total_operations,
            avg_load_per_shard,
            max_load_ratio,
            hottest_shard,
        }
    }
}
