use crate::iter::Entry;
use crate::stats::{Op, ShardStats};
use crossbeam_channel::Receiver;
use hashbrown::HashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;
use std::time::Duration;

type Table<V> = HashMap<String, Arc<V>>;

/// A single shard containing a HashMap protected by a read-write lock.
///
/// Every method takes the lock exactly once and releases it before returning,
/// including when a caller-supplied closure panics (guards drop on unwind and
/// parking_lot locks do not poison).
pub(crate) struct Shard<V> {
    map: RwLock<Table<V>>,
    stats: ShardStats,
}

impl<V> Shard<V>
where
    V: Send + Sync,
{
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: RwLock::new(HashMap::with_capacity(capacity)),
            stats: ShardStats::new(),
        }
    }

    #[inline]
    fn read(&self) -> RwLockReadGuard<'_, Table<V>> {
        #[cfg(feature = "lock-timing")]
        let start = std::time::Instant::now();
        let guard = self.map.read();
        #[cfg(feature = "lock-timing")]
        self.stats.record_lock_wait(start.elapsed().as_nanos() as u64);
        self.stats.record_lock_acquisition();
        guard
    }

    #[inline]
    fn write(&self) -> RwLockWriteGuard<'_, Table<V>> {
        #[cfg(feature = "lock-timing")]
        let start = std::time::Instant::now();
        let guard = self.map.write();
        #[cfg(feature = "lock-timing")]
        self.stats.record_lock_wait(start.elapsed().as_nanos() as u64);
        self.stats.record_lock_acquisition();
        guard
    }

    /// Insert or overwrite a key-value pair.
    pub fn set(&self, key: String, value: V) {
        let mut map = self.write();
        map.insert(key, Arc::new(value));
        self.stats.record(Op::Set);
    }

    /// Insert only if the key is absent. Returns true if the value was stored.
    pub fn set_if_absent(&self, key: String, value: V) -> bool {
        let mut map = self.write();
        if map.contains_key(key.as_str()) {
            self.stats.record(Op::Rejected);
            return false;
        }
        map.insert(key, Arc::new(value));
        self.stats.record(Op::Inserted);
        true
    }

    /// Run `f` on the current value (if any) and the new value under the
    /// write lock, store its result and return it.
    pub fn upsert<F>(&self, key: String, value: V, f: F) -> Arc<V>
    where
        F: FnOnce(Option<&V>, V) -> V,
    {
        let mut map = self.write();
        let stored = Arc::new(f(map.get(key.as_str()).map(|v| &**v), value));
        map.insert(key, Arc::clone(&stored));
        self.stats.record(Op::Upsert);
        stored
    }

    /// Get a value by key, returning an Arc to enable zero-copy access.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let map = self.read();
        let result = map.get(key).cloned();
        self.stats
            .record(if result.is_some() { Op::Hit } else { Op::Miss });
        result
    }

    /// Check if a key exists without cloning the value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// Remove a key and return its value, if it existed.
    pub fn pop(&self, key: &str) -> Option<Arc<V>> {
        let mut map = self.write();
        let result = map.remove(key);
        if result.is_some() {
            self.stats.record(Op::Remove);
        }
        result
    }

    /// Ask `f` whether to delete the entry. The entry is only removed when it
    /// exists and `f` returns true; `f`'s decision is returned either way.
    pub fn remove_cb<F>(&self, key: &str, f: F) -> bool
    where
        F: FnOnce(&str, Option<&V>) -> bool,
    {
        let mut map = self.write();
        let existing = map.get(key);
        let exists = existing.is_some();
        let remove = f(key, existing.map(|v| &**v));
        if remove && exists {
            map.remove(key);
            self.stats.record(Op::Remove);
        }
        remove
    }

    /// Get the number of entries in this shard.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Get a snapshot of statistics for this shard.
    pub fn stats(&self) -> crate::stats::ShardOps {
        self.stats.snapshot()
    }

    /// Call `f` for every entry while holding the read lock.
    pub fn for_each<F>(&self, f: &mut F)
    where
        F: FnMut(&str, &V),
    {
        let map = self.read();
        for (key, value) in map.iter() {
            f(key, value);
        }
    }

    /// Copy this shard's entries into a buffer sized to the shard, under a
    /// single read lock. The returned receiver is complete: its sender is
    /// dropped before returning.
    pub fn snapshot(&self) -> Receiver<Entry<V>> {
        let map = self.read();
        let (tx, rx) = crossbeam_channel::bounded(map.len());
        self.stats.record_snapshot(map.len());
        for (key, value) in map.iter() {
            if tx.send((key.clone(), Arc::clone(value))).is_err() {
                break;
            }
        }
        rx
    }

    /// Like `get`, but gives up after `timeout`.
    pub fn try_get_for(&self, key: &str, timeout: Duration) -> Option<Option<Arc<V>>> {
        let map = self.map.try_read_for(timeout)?;
        self.stats.record_lock_acquisition();
        let result = map.get(key).cloned();
        self.stats
            .record(if result.is_some() { Op::Hit } else { Op::Miss });
        Some(result)
    }

    /// Like `set`, but gives up after `timeout`. Returns false on timeout.
    pub fn try_set_for(&self, key: String, value: V, timeout: Duration) -> bool {
        let Some(mut map) = self.map.try_write_for(timeout) else {
            return false;
        };
        self.stats.record_lock_acquisition();
        map.insert(key, Arc::new(value));
        self.stats.record(Op::Set);
        true
    }
}
