use crate::providers::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt snapshot {path}: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("Stale snapshot version for {kind}: {version} is not newer than {latest}")]
    StaleVersion {
        kind: &'static str,
        version: u64,
        latest: u64,
    },
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot store error: {0}")]
    Store(#[from] StoreError),

    #[error("Trading pair fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Refusing to snapshot an empty trading pair set")]
    EmptyPairs,
}
