use crate::config::{create_hasher, Config, ShardRouter};
use crate::error::Error;
use crate::hash::ShardHasher;
use crate::iter::SnapshotIter;
use crate::shard::Shard;
use crate::stats::{Diagnostics, ShardOps, Stats};
use hashbrown::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Concurrent string-keyed map split into independently locked shards.
///
/// Each key is routed to exactly one shard, so single-key operations only
/// ever touch one lock. Whole-map operations visit the shards one lock at a
/// time and are therefore only exact on a quiescent map. Values are wrapped
/// in `Arc<V>` so reads can share them without copying.
///
/// # Example
///
/// ```rust
/// use shardcmap::ShardMap;
///
/// let map = ShardMap::new();
/// map.set("key1", "value1");
///
/// if let Some(value) = map.get("key1") {
///     println!("Found: {}", *value);
/// }
/// ```
pub struct ShardMap<V> {
    shards: Vec<Shard<V>>,
    hash: ShardHasher,
    router: Box<dyn ShardRouter>,
}

impl<V> ShardMap<V>
where
    V: Send + Sync,
{
    /// Create a new map with defaults (32 shards, FNV routing).
    pub fn new() -> Self {
        let shards = (0..crate::config::DEFAULT_SHARD_COUNT)
            .map(|_| Shard::with_capacity(0))
            .collect();
        Self::from_parts(shards, Config::default())
    }

    /// Create a new map with `shard_count` shards and otherwise default settings.
    pub fn with_shard_count(shard_count: usize) -> Result<Self, Error> {
        Self::with_config(Config::new().shard_count(shard_count)?)
    }

    /// Create a new map with custom config.
    pub fn with_config(config: Config) -> Result<Self, Error> {
        if config.shard_count == 0 {
            return Err(Error::InvalidShardCount);
        }

        let capacity = config.capacity_per_shard.unwrap_or(0);
        let shards = (0..config.shard_count)
            .map(|_| Shard::with_capacity(capacity))
            .collect();

        Ok(Self::from_parts(shards, config))
    }

    fn from_parts(shards: Vec<Shard<V>>, config: Config) -> Self {
        tracing::debug!(
            shard_count = config.shard_count,
            hash = ?config.hash_function,
            "created shard map"
        );
        Self {
            shards,
            hash: create_hasher(config.hash_function),
            router: config.routing.into_router(),
        }
    }

    /// Number of shards. Fixed for the lifetime of the map.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Figure out which shard this key belongs to.
    ///
    /// Pure: the same key always maps to the same index for this map.
    #[inline]
    pub fn shard_index(&self, key: &str) -> usize {
        let hash = self.hash.hash_key(key);
        self.router.route(hash, self.shards.len()) % self.shards.len()
    }

    #[inline]
    fn shard(&self, key: &str) -> &Shard<V> {
        &self.shards[self.shard_index(key)]
    }

    /// Get a value by key. Returns an `Arc<V>` so you can share it without copying.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shardcmap::ShardMap;
    ///
    /// let map = ShardMap::new();
    /// map.set("key", "value");
    ///
    /// assert_eq!(*map.get("key").unwrap(), "value");
    /// assert!(map.get("missing").is_none());
    /// ```
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        self.shard(key).get(key)
    }

    /// Insert a key-value pair, overwriting any previous value.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        self.shard(&key).set(key, value)
    }

    /// Apply `set` for every entry. Not atomic: concurrent readers may see a
    /// partially applied batch.
    pub fn mset<K, I>(&self, entries: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.set(key, value);
        }
    }

    /// Store `value` only if `key` is absent. Returns true if it was stored.
    ///
    /// Among concurrent callers racing on the same absent key, exactly one
    /// gets `true`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shardcmap::ShardMap;
    ///
    /// let map = ShardMap::new();
    /// assert!(map.set_if_absent("key", 1));
    /// assert!(!map.set_if_absent("key", 2));
    /// assert_eq!(*map.get("key").unwrap(), 1);
    /// ```
    pub fn set_if_absent(&self, key: impl Into<String>, value: V) -> bool {
        let key = key.into();
        self.shard(&key).set_if_absent(key, value)
    }

    /// Insert or update through a callback.
    ///
    /// `f` receives the current value (`None` if absent) and `value`, and
    /// its result is stored and returned. It runs exactly once, under the
    /// shard's write lock, so no other operation on that shard interleaves
    /// with it. `f` must not access this map, or it will deadlock. A panic in
    /// `f` propagates to the caller and leaves the entry unchanged.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shardcmap::ShardMap;
    ///
    /// let map = ShardMap::new();
    /// map.set("counter", 1);
    ///
    /// let stored = map.upsert("counter", 10, |old, new| old.copied().unwrap_or(0) + new);
    /// assert_eq!(*stored, 11);
    /// ```
    pub fn upsert<F>(&self, key: impl Into<String>, value: V, f: F) -> Arc<V>
    where
        F: FnOnce(Option<&V>, V) -> V,
    {
        let key = key.into();
        self.shard(&key).upsert(key, value, f)
    }

    /// Check if a key exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.shard(key).contains_key(key)
    }

    /// Alias for [`ShardMap::contains_key`].
    pub fn has(&self, key: &str) -> bool {
        self.contains_key(key)
    }

    /// Remove a key. No-op if absent.
    pub fn remove(&self, key: &str) {
        self.shard(key).pop(key);
    }

    /// Remove a key if `f` agrees.
    ///
    /// `f` receives the key and the current value (`None` if absent) under
    /// the shard's write lock. The entry is deleted only when it exists and
    /// `f` returns true. Returns `f`'s decision.
    pub fn remove_cb<F>(&self, key: &str, f: F) -> bool
    where
        F: FnOnce(&str, Option<&V>) -> bool,
    {
        self.shard(key).remove_cb(key, f)
    }

    /// Remove a key and return its last value.
    pub fn pop(&self, key: &str) -> Option<Arc<V>> {
        self.shard(key).pop(key)
    }

    /// Get the total number of entries across all shards.
    ///
    /// Shards are counted one at a time under their own read lock; no global
    /// lock is taken, so the result is approximate under concurrent writes.
    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    /// Alias for [`ShardMap::len`].
    pub fn count(&self) -> usize {
        self.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call `f` for every entry, shard by shard.
    ///
    /// The read lock of a shard is held while `f` runs over that shard's
    /// entries, so each shard is seen consistently but shards are not
    /// consistent with each other. `f` must not write to this map.
    pub fn iter_cb<F>(&self, mut f: F)
    where
        F: FnMut(&str, &V),
    {
        for shard in &self.shards {
            shard.for_each(&mut f);
        }
    }

    /// Per-shard entry counts.
    pub fn shard_loads(&self) -> Vec<usize> {
        self.shards.iter().map(Shard::len).collect()
    }

    /// Get detailed statistics about the map and its shards.
    pub fn stats(&self) -> Stats {
        let shard_sizes = self.shard_loads();
        let operations: Vec<ShardOps> = self.shards.iter().map(Shard::stats).collect();
        let size: usize = shard_sizes.iter().sum();

        Stats {
            size,
            shard_sizes,
            operations,
        }
    }

    /// Load-balance and operation summary for introspection.
    pub fn diagnostics(&self) -> Diagnostics {
        let Stats {
            shard_sizes,
            operations,
            ..
        } = self.stats();
        Diagnostics::from_shards(shard_sizes, operations)
    }

    /// Like [`ShardMap::get`], but fails with [`Error::LockTimeout`] if the
    /// shard lock is not acquired within `timeout`.
    pub fn try_get_for(&self, key: &str, timeout: Duration) -> Result<Option<Arc<V>>, Error> {
        self.shard(key).try_get_for(key, timeout).ok_or_else(|| {
            tracing::debug!(key, ?timeout, "read lock timeout");
            Error::LockTimeout
        })
    }

    /// Like [`ShardMap::set`], but fails with [`Error::LockTimeout`] if the
    /// shard lock is not acquired within `timeout`.
    pub fn try_set_for(
        &self,
        key: impl Into<String>,
        value: V,
        timeout: Duration,
    ) -> Result<(), Error> {
        let key = key.into();
        let shard = self.shard(&key);
        if shard.try_set_for(key, value, timeout) {
            Ok(())
        } else {
            tracing::debug!(?timeout, "write lock timeout");
            Err(Error::LockTimeout)
        }
    }
}

impl<V> ShardMap<V>
where
    V: Send + Sync + 'static,
{
    /// Snapshot every shard and return a lazily delivered sequence of all
    /// entries.
    ///
    /// Each shard is captured at one instant under its read lock; shards are
    /// captured independently. Writes to a shard after its capture are not
    /// seen, and entries removed after capture are still yielded. Order is
    /// unspecified.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shardcmap::ShardMap;
    ///
    /// let map = ShardMap::new();
    /// map.set("key1", "value1");
    /// map.set("key2", "value2");
    ///
    /// assert_eq!(map.iter_snapshot().count(), 2);
    /// ```
    pub fn iter_snapshot(&self) -> SnapshotIter<V> {
        SnapshotIter::new(&self.shards)
    }

    /// All keys present in a fresh snapshot.
    pub fn keys(&self) -> Vec<String> {
        self.iter_snapshot().map(|(key, _)| key).collect()
    }

    /// All entries present in a fresh snapshot, in the same map type the
    /// shards use.
    pub fn items(&self) -> HashMap<String, Arc<V>> {
        self.iter_snapshot().collect()
    }

    /// Remove every key seen in a fresh snapshot, one key at a time.
    ///
    /// Not atomic: an insert racing with `clear` may or may not survive.
    pub fn clear(&self) {
        let mut removed = 0usize;
        for (key, _) in self.iter_snapshot() {
            self.remove(&key);
            removed += 1;
        }
        tracing::debug!(removed, "cleared shard map");
    }
}

impl<V> Default for ShardMap<V>
where
    V: Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for ShardMap<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardMap")
            .field("shard_count", &self.shards.len())
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

impl<K, V> FromIterator<(K, V)> for ShardMap<V>
where
    K: Into<String>,
    V: Send + Sync,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = Self::new();
        map.mset(iter);
        map
    }
}

impl<K, V> Extend<(K, V)> for ShardMap<V>
where
    K: Into<String>,
    V: Send + Sync,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.mset(iter);
    }
}
