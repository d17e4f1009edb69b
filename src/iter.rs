//! Snapshot/merge iteration over all shards.
//!
//! Iteration runs in two phases:
//!
//! 1. Every shard is snapshotted in parallel. Each task holds exactly one
//!    shard's read lock while it copies that shard's entries into a buffer
//!    sized to the shard. All buffer sizes are known before phase 2 starts.
//! 2. The per-shard buffers are drained concurrently into one combined
//!    buffer sized to their total, which completes once every shard buffer
//!    has been drained.
//!
//! Each shard's contribution reflects that shard at one instant; there is no
//! atomic view across shards. Entry order is unspecified.

use crate::shard::Shard;
use crossbeam_channel::{Receiver, TryRecvError};
use rayon::prelude::*;
use std::sync::Arc;

/// A key and a shared handle to its value.
pub type Entry<V> = (String, Arc<V>);

/// Lazily delivered sequence of every entry captured by a snapshot.
///
/// Entries arrive as the background drain tasks forward them. The total is
/// fixed when the iterator is created, so `len()` is exact.
pub struct SnapshotIter<V> {
    rx: Receiver<Entry<V>>,
    remaining: usize,
}

impl<V> SnapshotIter<V>
where
    V: Send + Sync + 'static,
{
    pub(crate) fn new(shards: &[Shard<V>]) -> Self {
        merge(snapshot(shards))
    }
}

/// Phase 1: one complete, pre-sized buffer per shard.
fn snapshot<V>(shards: &[Shard<V>]) -> Vec<Receiver<Entry<V>>>
where
    V: Send + Sync,
{
    shards.par_iter().map(Shard::snapshot).collect()
}

/// Phase 2: fan the shard buffers into one combined buffer.
fn merge<V>(buffers: Vec<Receiver<Entry<V>>>) -> SnapshotIter<V>
where
    V: Send + Sync + 'static,
{
    let total: usize = buffers.iter().map(Receiver::len).sum();
    tracing::trace!(shards = buffers.len(), entries = total, "snapshot buffers sized");

    let (tx, rx) = crossbeam_channel::bounded(total);
    for buffer in buffers.into_iter().filter(|buffer| !buffer.is_empty()) {
        let tx = tx.clone();
        rayon::spawn(move || {
            for entry in buffer {
                // Consumer dropped the iterator.
                if tx.send(entry).is_err() {
                    break;
                }
            }
        });
    }

    SnapshotIter {
        rx,
        remaining: total,
    }
}

impl<V> Iterator for SnapshotIter<V> {
    type Item = Entry<V>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = loop {
            match self.rx.try_recv() {
                Ok(entry) => break entry,
                Err(TryRecvError::Disconnected) => return None,
                // Inside the rayon pool, run pending drain tasks instead of
                // blocking the worker that would execute them.
                Err(TryRecvError::Empty) => match rayon::yield_now() {
                    Some(rayon::Yield::Executed) => continue,
                    _ => break self.rx.recv().ok()?,
                },
            }
        };
        self.remaining = self.remaining.saturating_sub(1);
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for SnapshotIter<V> {}
