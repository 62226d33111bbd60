//! Versioned token snapshots
//!
//! Two kinds are tracked: the raw trading pair list as returned by the
//! exchange, and the canonical token set extracted from it. Each write gets a
//! strictly increasing version; the latest version of a kind wins.

use super::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    RawPairs,
    CanonicalTokens,
}

impl SnapshotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::RawPairs => "raw_pairs",
            SnapshotKind::CanonicalTokens => "canonical_tokens",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSnapshot {
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<String>,
}

impl TokenSnapshot {
    /// Entries are stored sorted so snapshot files diff cleanly
    pub fn new(version: u64, entries: impl IntoIterator<Item = String>) -> Self {
        let entries: BTreeSet<String> = entries.into_iter().collect();
        Self {
            version,
            created_at: Utc::now(),
            entries: entries.into_iter().collect(),
        }
    }

    pub fn entry_set(&self) -> BTreeSet<String> {
        self.entries.iter().cloned().collect()
    }
}

pub trait SnapshotStore: Send + Sync {
    fn latest(&self, kind: SnapshotKind) -> Result<Option<TokenSnapshot>, StoreError>;

    /// Persist `snapshot`. Fails with [`StoreError::StaleVersion`] unless its
    /// version is strictly newer than the current latest of that kind.
    fn put(&self, kind: SnapshotKind, snapshot: &TokenSnapshot) -> Result<(), StoreError>;
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    fn latest(&self, kind: SnapshotKind) -> Result<Option<TokenSnapshot>, StoreError> {
        (**self).latest(kind)
    }

    fn put(&self, kind: SnapshotKind, snapshot: &TokenSnapshot) -> Result<(), StoreError> {
        (**self).put(kind, snapshot)
    }
}

fn check_version(
    kind: SnapshotKind,
    latest: Option<&TokenSnapshot>,
    version: u64,
) -> Result<(), StoreError> {
    match latest {
        Some(prev) if version <= prev.version => Err(StoreError::StaleVersion {
            kind: kind.as_str(),
            version,
            latest: prev.version,
        }),
        _ => Ok(()),
    }
}

// ============================================================
// File store
// ============================================================

/// Layout: `<root>/<kind>/<kind>-<version>.json`
pub struct FileSnapshotStore {
    root: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn kind_dir(&self, kind: SnapshotKind) -> PathBuf {
        self.root.join(kind.as_str())
    }

    fn read_snapshot(path: &Path) -> Result<TokenSnapshot, StoreError> {
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn latest(&self, kind: SnapshotKind) -> Result<Option<TokenSnapshot>, StoreError> {
        let dir = self.kind_dir(kind);
        if !dir.exists() {
            return Ok(None);
        }

        let mut best: Option<TokenSnapshot> = None;
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let is_temp = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if is_temp || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            // Version comes from the file body, not the name
            match Self::read_snapshot(&path) {
                Ok(snap) => {
                    if best.as_ref().is_none_or(|b| snap.version > b.version) {
                        best = Some(snap);
                    }
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable snapshot"),
            }
        }

        Ok(best)
    }

    fn put(&self, kind: SnapshotKind, snapshot: &TokenSnapshot) -> Result<(), StoreError> {
        let current = self.latest(kind)?;
        check_version(kind, current.as_ref(), snapshot.version)?;

        let dir = self.kind_dir(kind);
        fs::create_dir_all(&dir)?;

        let name = format!("{}-{:020}.json", kind.as_str(), snapshot.version);
        let final_path = dir.join(&name);
        let tmp_path = dir.join(format!(".tmp-{}", name));

        let body = serde_json::to_string_pretty(snapshot).map_err(|e| StoreError::Corrupt {
            path: final_path.display().to_string(),
            reason: e.to_string(),
        })?;
        fs::write(&tmp_path, body)?;
        fs::rename(&tmp_path, &final_path)?;

        debug!(
            kind = kind.as_str(),
            version = snapshot.version,
            entries = snapshot.entries.len(),
            "Snapshot written"
        );
        Ok(())
    }
}

// ============================================================
// In-memory store
// ============================================================

#[derive(Default)]
pub struct MemorySnapshotStore {
    raw: Mutex<Vec<TokenSnapshot>>,
    canonical: Mutex<Vec<TokenSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: SnapshotKind) -> &Mutex<Vec<TokenSnapshot>> {
        match kind {
            SnapshotKind::RawPairs => &self.raw,
            SnapshotKind::CanonicalTokens => &self.canonical,
        }
    }

    /// Number of snapshots written for `kind`
    pub fn count(&self, kind: SnapshotKind) -> usize {
        self.slot(kind).lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn latest(&self, kind: SnapshotKind) -> Result<Option<TokenSnapshot>, StoreError> {
        let guard = self.slot(kind).lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.last().cloned())
    }

    fn put(&self, kind: SnapshotKind, snapshot: &TokenSnapshot) -> Result<(), StoreError> {
        let mut guard = self.slot(kind).lock().unwrap_or_else(|e| e.into_inner());
        check_version(kind, guard.last(), snapshot.version)?;
        guard.push(snapshot.clone());
        Ok(())
    }
}
