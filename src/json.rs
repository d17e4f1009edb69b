use crate::error::Error;
use crate::shardmap::ShardMap;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// A map holding arbitrary JSON values.
pub type ValueMap = ShardMap<serde_json::Value>;

/// Serializes as an object built from a fresh snapshot (see
/// [`ShardMap::items`]). Shards are captured independently.
impl<V> Serialize for ShardMap<V>
where
    V: Serialize + Send + Sync + 'static,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let items = self.items();
        let mut map = serializer.serialize_map(Some(items.len()))?;
        for (key, value) in &items {
            map.serialize_entry(key, &**value)?;
        }
        map.end()
    }
}

/// Deserializes a JSON object into a map with the default configuration.
impl<'de, V> Deserialize<'de> for ShardMap<V>
where
    V: Deserialize<'de> + Send + Sync,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = HashMap::<String, V>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

impl<V> ShardMap<V>
where
    V: Serialize + Send + Sync + 'static,
{
    /// Encode the whole map as a JSON object.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shardcmap::ShardMap;
    ///
    /// let map = ShardMap::new();
    /// map.set("a", 1);
    /// assert_eq!(map.to_json()?, r#"{"a":1}"#);
    /// # Ok::<(), shardcmap::Error>(())
    /// ```
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    /// Encode the whole map as an indented JSON object.
    pub fn to_json_pretty(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<V> ShardMap<V>
where
    V: serde::de::DeserializeOwned + Send + Sync,
{
    /// Build a default-configured map from a JSON object.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }
}
