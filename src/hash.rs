use std::hash::{Hash, Hasher};

const FNV_OFFSET_BASIS: u32 = 2166136261;
const FNV_PRIME: u32 = 16777619;

/// 32-bit FNV hash over the UTF-8 bytes of `key`.
///
/// Each byte is folded in as `hash = (hash * prime) ^ byte` with wrapping
/// arithmetic. Shard assignment produced by `fnv32(key) % shard_count` is
/// bit-compatible with other implementations of the same scheme.
///
/// No protection against adversarially chosen keys.
///
/// ```rust
/// assert_eq!(shardcmap::hash::fnv32(""), 2166136261);
/// assert_eq!(shardcmap::hash::fnv32("a"), 0x050c_5d7e);
/// ```
#[inline]
pub fn fnv32(key: &str) -> u32 {
    key.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        hash.wrapping_mul(FNV_PRIME) ^ u32::from(byte)
    })
}

/// Hash function implementation for shard assignment.
/// Uses an enum to avoid trait object limitations on the hot path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShardHasher {
    /// 32-bit FNV (default, cross-implementation stable).
    #[default]
    Fnv1a,
    /// AHash with fixed keys. Stable within a process only.
    AHash,
    /// FxHash implementation (faster but potentially less distributed).
    #[cfg(feature = "fxhash")]
    FxHash,
}

impl ShardHasher {
    /// Hash a key to determine which shard it belongs to.
    pub fn hash_key(&self, key: &str) -> u64 {
        match self {
            ShardHasher::Fnv1a => u64::from(fnv32(key)),
            ShardHasher::AHash => {
                let mut hasher = ahash::AHasher::default();
                key.hash(&mut hasher);
                hasher.finish()
            }
            #[cfg(feature = "fxhash")]
            ShardHasher::FxHash => {
                let mut hasher = fxhash::FxHasher::default();
                key.hash(&mut hasher);
                hasher.finish()
            }
        }
    }
}
