use serde::{Deserialize, Serialize};
use serde_json::json;
use shardcmap::{ShardMap, ValueMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Session {
    user: String,
    hits: u32,
}

#[test]
fn test_export_matches_contents() {
    let map = ShardMap::new();
    for i in 0..100 {
        map.set(format!("key_{}", i), i);
    }

    let exported: serde_json::Value = serde_json::from_str(&map.to_json().unwrap()).unwrap();
    let object = exported.as_object().unwrap();
    assert_eq!(object.len(), 100);
    for i in 0..100 {
        assert_eq!(object[&format!("key_{}", i)], json!(i));
    }
}

#[test]
fn test_struct_values_round_trip() {
    let map = ShardMap::new();
    map.set(
        "s1",
        Session {
            user: "ana".to_string(),
            hits: 3,
        },
    );

    let restored: ShardMap<Session> = ShardMap::from_json(&map.to_json_pretty().unwrap()).unwrap();
    assert_eq!(restored.len(), 1);
    assert_eq!(restored.get("s1").unwrap().hits, 3);
}

#[test]
fn test_dynamic_values() {
    let map = ValueMap::from_json(r#"{"a": 1, "b": {"nested": true}, "c": null}"#).unwrap();
    assert_eq!(map.len(), 3);
    assert_eq!(*map.get("b").unwrap(), json!({"nested": true}));

    map.upsert("a", json!(10), |old, new| {
        json!(old.and_then(|v| v.as_i64()).unwrap_or(0) + new.as_i64().unwrap_or(0))
    });
    assert_eq!(*map.get("a").unwrap(), json!(11));
}

#[test]
fn test_serialize_inside_larger_document() {
    let map = ShardMap::new();
    map.set("x", 1);

    let doc = json!({ "cache": map, "version": 2 });
    assert_eq!(doc["cache"]["x"], json!(1));
}
