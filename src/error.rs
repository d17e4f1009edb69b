/// Errors that can occur when building or exporting a ShardMap.
///
/// Single-key reads and writes never fail; a missing key is reported as `None`
/// or `false`, not as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The shard count is invalid (must be greater than 0).
    InvalidShardCount,
    /// A shard lock could not be acquired within the requested timeout.
    LockTimeout,
    /// JSON encoding or decoding failed.
    Json(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidShardCount => write!(f, "shard count must be greater than 0"),
            Error::LockTimeout => write!(f, "timed out waiting for shard lock"),
            Error::Json(msg) => write!(f, "json error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}
