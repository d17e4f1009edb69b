use shardcmap::{Error, ShardMap, ShardMapBuilder};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_basic_set_get() {
    let map = ShardMap::new();

    map.set("key1", "value1");
    assert_eq!(*map.get("key1").unwrap(), "value1");

    // Overwrite
    map.set("key1", "value2");
    assert_eq!(*map.get("key1").unwrap(), "value2");
    assert_eq!(map.len(), 1);
}

#[test]
fn test_remove() {
    let map = ShardMap::new();

    map.set("key1", "value1");
    map.remove("key1");
    assert!(map.get("key1").is_none());

    // Removing a missing key is a no-op
    map.remove("key1");
    assert!(map.is_empty());
}

#[test]
fn test_pop() {
    let map = ShardMap::new();

    map.set("key1", 7);
    assert_eq!(*map.pop("key1").unwrap(), 7);
    assert!(!map.has("key1"));
    assert!(map.pop("key1").is_none());
}

#[test]
fn test_mset() {
    let map = ShardMap::new();
    map.mset(vec![("a", 1), ("b", 2), ("c", 3)]);

    assert_eq!(map.len(), 3);
    assert_eq!(*map.get("b").unwrap(), 2);
}

#[test]
fn test_set_if_absent() {
    let map = ShardMap::new();

    assert!(map.set_if_absent("key", "first"));
    assert!(!map.set_if_absent("key", "second"));
    assert_eq!(*map.get("key").unwrap(), "first");
}

#[test]
fn test_upsert_scenario() {
    let map = ShardMap::new();
    map.set("a", 1);
    map.set("b", 2);

    let mut calls = Vec::new();
    let stored = map.upsert("a", 10, |old, new| {
        calls.push((old.is_some(), old.copied()));
        old.copied().unwrap_or(0) + new
    });

    assert_eq!(calls, vec![(true, Some(1))]);
    assert_eq!(*stored, 11);
    assert_eq!(*map.get("a").unwrap(), 11);

    assert!(map.remove_cb("b", |_, v| v == Some(&2)));
    assert!(!map.has("b"));
}

#[test]
fn test_upsert_inserts_when_absent() {
    let map = ShardMap::new();

    let stored = map.upsert("fresh", 5, |old, new| {
        assert!(old.is_none());
        new * 2
    });
    assert_eq!(*stored, 10);
    assert_eq!(*map.get("fresh").unwrap(), 10);
}

#[test]
fn test_remove_cb_declined() {
    let map = ShardMap::new();
    map.set("key", 1);

    assert!(!map.remove_cb("key", |k, v| {
        assert_eq!(k, "key");
        assert_eq!(v, Some(&1));
        false
    }));
    assert!(map.has("key"));
}

#[test]
fn test_remove_cb_missing_key() {
    let map: ShardMap<i32> = ShardMap::new();

    // The callback's decision is returned even when nothing was removed.
    let decided = map.remove_cb("missing", |_, v| {
        assert!(v.is_none());
        true
    });
    assert!(decided);
    assert!(map.is_empty());
}

#[test]
fn test_panicking_upsert_releases_lock() {
    let map = ShardMap::new();
    map.set("key", 1);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        map.upsert("key", 2, |_, _| panic!("boom"));
    }));
    assert!(result.is_err());

    assert_eq!(*map.get("key").unwrap(), 1);
    map.set("key", 3);
    assert_eq!(*map.get("key").unwrap(), 3);
}

#[test]
fn test_panicking_remove_cb_releases_lock() {
    let map = ShardMap::new();
    map.set("key", 1);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        map.remove_cb("key", |_, _| panic!("boom"));
    }));
    assert!(result.is_err());

    assert!(map.has("key"));
    map.remove("key");
    assert!(map.is_empty());
}

#[test]
fn test_len_and_is_empty() {
    let map = ShardMap::new();

    assert!(map.is_empty());
    assert_eq!(map.len(), 0);

    map.set("key1", "value1");
    assert!(!map.is_empty());
    assert_eq!(map.count(), 1);

    map.set("key2", "value2");
    assert_eq!(map.len(), 2);

    map.remove("key1");
    assert_eq!(map.len(), 1);
}

#[test]
fn test_clear() {
    let map = ShardMap::new();
    for i in 0..500 {
        map.set(format!("key_{}", i), i);
    }

    map.clear();
    assert_eq!(map.count(), 0);
    assert!(map.is_empty());
    assert!(map.keys().is_empty());
}

#[test]
fn test_keys_and_items() {
    let map = ShardMap::new();
    for i in 0..200 {
        map.set(format!("key_{}", i), i);
    }

    let keys = map.keys();
    assert_eq!(keys.len(), 200);
    let unique: HashSet<_> = keys.iter().cloned().collect();
    assert_eq!(unique.len(), 200);

    let items: hashbrown::HashMap<String, Arc<i32>> = map.items();
    assert_eq!(items.len(), 200);
    for i in 0..200 {
        assert_eq!(*items[&format!("key_{}", i)], i);
    }
}

#[test]
fn test_iter_snapshot() {
    let map = ShardMap::new();

    map.set("key1", "value1");
    map.set("key2", "value2");
    map.set("key3", "value3");

    let iter = map.iter_snapshot();
    assert_eq!(iter.len(), 3);

    let mut entries: Vec<_> = iter.collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(entries[0].0, "key1");
    assert_eq!(*entries[1].1, "value2");
    assert_eq!(entries[2].0, "key3");
}

#[test]
fn test_iter_cb() {
    let map = ShardMap::new();
    for i in 0..50 {
        map.set(format!("key_{}", i), i);
    }

    let mut sum = 0;
    let mut seen = HashSet::new();
    map.iter_cb(|key, value| {
        sum += *value;
        seen.insert(key.to_string());
    });

    assert_eq!(sum, (0..50).sum::<i32>());
    assert_eq!(seen.len(), 50);
}

#[test]
fn test_from_iterator_and_extend() {
    let mut map: ShardMap<i32> = vec![("a", 1), ("b", 2)].into_iter().collect();
    map.extend(vec![("c".to_string(), 3)]);

    assert_eq!(map.len(), 3);
    assert_eq!(*map.get("c").unwrap(), 3);
}

#[test]
fn test_builder() {
    let map = ShardMapBuilder::new()
        .shard_count(8)
        .unwrap()
        .capacity_per_shard(16)
        .build::<i32>()
        .unwrap();

    map.set("test", 42);
    assert_eq!(*map.get("test").unwrap(), 42);
}

#[test]
fn test_invalid_shard_count() {
    assert_eq!(
        ShardMapBuilder::new().shard_count(0).unwrap_err(),
        Error::InvalidShardCount
    );
    assert!(ShardMap::<i32>::with_shard_count(0).is_err());

    // Any positive count works, not just powers of two.
    let map = ShardMap::<i32>::with_shard_count(7).unwrap();
    assert_eq!(map.shard_count(), 7);
}

#[test]
fn test_arc_sharing() {
    let map = ShardMap::new();

    map.set("key", "value");
    let arc1 = map.get("key").unwrap();
    let arc2 = map.get("key").unwrap();

    assert!(Arc::ptr_eq(&arc1, &arc2));
}

#[test]
fn test_timed_access() {
    let map = ShardMap::new();

    map.try_set_for("key", 1, Duration::from_millis(50)).unwrap();
    assert_eq!(
        *map.try_get_for("key", Duration::from_millis(50))
            .unwrap()
            .unwrap(),
        1
    );
    assert!(map
        .try_get_for("missing", Duration::from_millis(50))
        .unwrap()
        .is_none());
}

#[test]
fn test_timed_access_times_out_inside_callback() {
    let map = Arc::new(ShardMap::with_shard_count(1).unwrap());
    map.set("held", 0);

    let result = std::thread::scope(|s| {
        let (locked_tx, locked_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        let holder = s.spawn(|| {
            map.upsert("held", 1, move |_, new| {
                locked_tx.send(()).unwrap();
                release_rx.recv().unwrap();
                new
            });
        });

        locked_rx.recv().unwrap();
        // Single shard, so every key is behind the held write lock.
        let result = map.try_get_for("other", Duration::from_millis(20));
        release_tx.send(()).unwrap();
        holder.join().unwrap();
        result
    });

    assert_eq!(result.unwrap_err(), Error::LockTimeout);
    assert_eq!(*map.get("held").unwrap(), 1);
}
