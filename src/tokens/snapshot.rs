//! Token Snapshot Manager
//!
//! Decides whether the exchange's pair list changed since the last run,
//! persists a new snapshot pair (raw + canonical) when it did, and reports
//! which canonical tokens are new.

use super::error::SnapshotError;
use super::extractor::SymbolExtractor;
use super::listing::{ListingIndex, ThousandFormToken, partition_listed};
use super::store::{SnapshotKind, SnapshotStore, TokenSnapshot};
use crate::config::TokenConfig;
use crate::providers::TradingPairSource;
use chrono::Utc;
use std::collections::BTreeSet;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotState {
    /// First run: every token is new
    NoPriorSnapshot,
    /// Pair list unchanged, prior canonical snapshot reused
    SnapshotCurrent,
    /// Pair list changed, or the canonical snapshot is missing or from a
    /// different version than the raw one: re-extracted
    SnapshotStale,
}

#[derive(Debug, Clone)]
pub struct TokenUpdate {
    pub all_tokens: Vec<String>,
    pub new_tokens: Vec<String>,
    pub existing_tokens: Vec<String>,
    pub symbols_changed: bool,
    pub state: SnapshotState,
    pub snapshot_version: u64,
    /// Tokens extracted from the listed pair subset, before partitioning
    pub listed_tokens: Vec<String>,
    pub standard_tokens: Vec<String>,
    pub thousand_form_tokens: Vec<ThousandFormToken>,
    pub listing: ListingIndex,
}

pub struct TokenSnapshotManager {
    store: Box<dyn SnapshotStore>,
    extractor: SymbolExtractor,
    config: TokenConfig,
}

impl TokenSnapshotManager {
    pub fn new(store: Box<dyn SnapshotStore>, config: &TokenConfig) -> Self {
        Self {
            store,
            extractor: SymbolExtractor::new(config),
            config: config.clone(),
        }
    }

    pub fn extractor(&self) -> &SymbolExtractor {
        &self.extractor
    }

    fn latest_or_none(&self, kind: SnapshotKind) -> Option<TokenSnapshot> {
        match self.store.latest(kind) {
            Ok(snap) => snap,
            Err(e) => {
                warn!(kind = kind.as_str(), error = %e, "Prior snapshot unreadable, treating as absent");
                None
            }
        }
    }

    fn next_version(&self, prior: &[Option<&TokenSnapshot>]) -> u64 {
        let floor = prior.iter().flatten().map(|s| s.version).max().unwrap_or(0) + 1;
        let now = Utc::now().timestamp_millis().max(0) as u64;
        floor.max(now)
    }

    /// Reconcile the current pair list against the stored snapshots.
    ///
    /// `listed_pairs` is the exchange's listed subset used for the listing
    /// index; when it yields no tokens the index falls back to `all_tokens`.
    pub fn update<S: AsRef<str>>(
        &self,
        current_pairs: &[S],
        listed_pairs: &[S],
    ) -> Result<TokenUpdate, SnapshotError> {
        let current: BTreeSet<String> = current_pairs
            .iter()
            .map(|p| p.as_ref().to_string())
            .collect();
        if current.is_empty() {
            return Err(SnapshotError::EmptyPairs);
        }

        let prior_raw = self.latest_or_none(SnapshotKind::RawPairs);
        let prior_canonical = self.latest_or_none(SnapshotKind::CanonicalTokens);
        let existing_tokens = prior_canonical
            .as_ref()
            .map(|s| s.entries.clone())
            .unwrap_or_default();

        // A pair written by the same update shares one version
        let state = match (&prior_raw, &prior_canonical) {
            (None, _) => SnapshotState::NoPriorSnapshot,
            (Some(raw), Some(canonical))
                if raw.version == canonical.version && raw.entry_set() == current =>
            {
                SnapshotState::SnapshotCurrent
            }
            _ => SnapshotState::SnapshotStale,
        };

        let (all_tokens, new_tokens, snapshot_version) = match (state, &prior_canonical) {
            (SnapshotState::SnapshotCurrent, Some(canonical)) => {
                info!(
                    version = canonical.version,
                    tokens = canonical.entries.len(),
                    "Trading pairs unchanged, reusing token snapshot"
                );
                (canonical.entries.clone(), Vec::new(), canonical.version)
            }
            _ => {
                let tokens = self.extractor.extract(&current);
                let version =
                    self.next_version(&[prior_raw.as_ref(), prior_canonical.as_ref()]);

                // Canonical goes last: if it fails the versions differ and
                // the next run re-extracts against the older canonical set
                self.store
                    .put(SnapshotKind::RawPairs, &TokenSnapshot::new(version, current.iter().cloned()))?;
                self.store.put(
                    SnapshotKind::CanonicalTokens,
                    &TokenSnapshot::new(version, tokens.iter().cloned()),
                )?;

                let previous: BTreeSet<&str> =
                    existing_tokens.iter().map(String::as_str).collect();
                let new_tokens: Vec<String> = tokens
                    .iter()
                    .filter(|t| !previous.contains(t.as_str()))
                    .cloned()
                    .collect();

                info!(
                    ?state,
                    version,
                    pairs = current.len(),
                    tokens = tokens.len(),
                    new = new_tokens.len(),
                    "Token snapshot updated"
                );
                (tokens.into_iter().collect(), new_tokens, version)
            }
        };

        // Listed subset is always derived fresh
        let listed_tokens: Vec<String> = self.extractor.extract(listed_pairs).into_iter().collect();
        let (standard_tokens, thousand_form_tokens) = if listed_tokens.is_empty() {
            warn!("No listed tokens available, listing index built from all tokens");
            partition_listed(&all_tokens, &self.config)
        } else {
            partition_listed(&listed_tokens, &self.config)
        };
        let listing = ListingIndex::new(standard_tokens.clone(), thousand_form_tokens.clone());

        Ok(TokenUpdate {
            all_tokens,
            new_tokens,
            existing_tokens,
            symbols_changed: state != SnapshotState::SnapshotCurrent,
            state,
            snapshot_version,
            listed_tokens,
            standard_tokens,
            thousand_form_tokens,
            listing,
        })
    }

    /// Fetch pairs from `source` and reconcile. A failed primary fetch aborts
    /// before anything is written; a failed listed-subset fetch degrades to
    /// an empty list.
    pub async fn sync(&self, source: &dyn TradingPairSource) -> Result<TokenUpdate, SnapshotError> {
        let pairs = source.fetch_pairs().await?;
        info!(
            pairs = pairs.all.len(),
            trading = pairs.trading.len(),
            "Fetched trading pairs"
        );

        self.update(&pairs.all, &pairs.trading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::FetchError;
    use crate::tokens::{ListingKind, MemorySnapshotStore, StoreError};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn manager() -> (TokenSnapshotManager, Arc<MemorySnapshotStore>) {
        let store = Arc::new(MemorySnapshotStore::new());
        let mgr = TokenSnapshotManager::new(Box::new(store.clone()), &TokenConfig::default());
        (mgr, store)
    }

    fn pairs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_run_everything_is_new() {
        let (mgr, store) = manager();
        let current = pairs(&["BTCUSDT", "ETHUSDT"]);

        let update = mgr.update(&current, &current).unwrap();

        assert_eq!(update.state, SnapshotState::NoPriorSnapshot);
        assert!(update.symbols_changed);
        assert_eq!(update.all_tokens, vec!["BTC", "ETH"]);
        assert_eq!(update.new_tokens, vec!["BTC", "ETH"]);
        assert!(update.existing_tokens.is_empty());
        assert_eq!(store.count(SnapshotKind::RawPairs), 1);
        assert_eq!(store.count(SnapshotKind::CanonicalTokens), 1);
    }

    #[test]
    fn test_unchanged_pairs_reuse_snapshot() {
        let (mgr, store) = manager();
        let current = pairs(&["BTCUSDT", "ETHUSDT", "1000SATSUSDT"]);

        let first = mgr.update(&current, &current).unwrap();
        // Order is irrelevant for the comparison
        let reordered = pairs(&["1000SATSUSDT", "ETHUSDT", "BTCUSDT"]);
        let second = mgr.update(&reordered, &reordered).unwrap();

        assert!(!second.symbols_changed);
        assert_eq!(second.state, SnapshotState::SnapshotCurrent);
        assert_eq!(second.all_tokens, first.all_tokens);
        assert!(second.new_tokens.is_empty());
        assert_eq!(second.snapshot_version, first.snapshot_version);
        assert_eq!(store.count(SnapshotKind::RawPairs), 1);
    }

    #[test]
    fn test_changed_pairs_report_only_new_tokens() {
        let (mgr, _store) = manager();
        let first = mgr.update(&pairs(&["BTCUSDT"]), &[]).unwrap();
        let second = mgr.update(&pairs(&["BTCUSDT", "SOLUSDT"]), &[]).unwrap();

        assert_eq!(second.state, SnapshotState::SnapshotStale);
        assert!(second.symbols_changed);
        assert_eq!(second.new_tokens, vec!["SOL"]);
        assert_eq!(second.existing_tokens, vec!["BTC"]);
        assert!(second.snapshot_version > first.snapshot_version);
    }

    #[test]
    fn test_missing_canonical_snapshot_forces_reextract() {
        let (mgr, store) = manager();
        store
            .put(SnapshotKind::RawPairs, &TokenSnapshot::new(1, pairs(&["BTCUSDT"])))
            .unwrap();

        let update = mgr.update(&pairs(&["BTCUSDT"]), &[]).unwrap();
        assert_eq!(update.state, SnapshotState::SnapshotStale);
        assert_eq!(update.all_tokens, vec!["BTC"]);
        assert_eq!(store.count(SnapshotKind::CanonicalTokens), 1);
    }

    /// Memory store whose canonical writes can be made to fail
    struct FlakyCanonicalStore {
        inner: MemorySnapshotStore,
        fail_canonical: AtomicBool,
    }

    impl SnapshotStore for FlakyCanonicalStore {
        fn latest(&self, kind: SnapshotKind) -> Result<Option<TokenSnapshot>, StoreError> {
            self.inner.latest(kind)
        }

        fn put(&self, kind: SnapshotKind, snapshot: &TokenSnapshot) -> Result<(), StoreError> {
            if kind == SnapshotKind::CanonicalTokens && self.fail_canonical.load(Ordering::SeqCst) {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.inner.put(kind, snapshot)
        }
    }

    #[test]
    fn test_failed_canonical_write_forces_reextract() {
        let store = Arc::new(FlakyCanonicalStore {
            inner: MemorySnapshotStore::new(),
            fail_canonical: AtomicBool::new(false),
        });
        let mgr = TokenSnapshotManager::new(Box::new(store.clone()), &TokenConfig::default());
        mgr.update(&pairs(&["BTCUSDT"]), &[]).unwrap();

        let grown = pairs(&["BTCUSDT", "SOLUSDT"]);
        store.fail_canonical.store(true, Ordering::SeqCst);
        assert!(matches!(mgr.update(&grown, &[]), Err(SnapshotError::Store(_))));

        // Raw pairs moved on without their canonical set
        store.fail_canonical.store(false, Ordering::SeqCst);
        let update = mgr.update(&grown, &[]).unwrap();

        assert_eq!(update.state, SnapshotState::SnapshotStale);
        assert!(update.symbols_changed);
        assert_eq!(update.all_tokens, vec!["BTC", "SOL"]);
        assert_eq!(update.new_tokens, vec!["SOL"]);

        let raw = store.latest(SnapshotKind::RawPairs).unwrap().unwrap();
        let canonical = store.latest(SnapshotKind::CanonicalTokens).unwrap().unwrap();
        assert_eq!(raw.version, canonical.version);

        // Consistent again: the following run reuses it
        let again = mgr.update(&grown, &[]).unwrap();
        assert_eq!(again.state, SnapshotState::SnapshotCurrent);
    }

    #[test]
    fn test_empty_pairs_rejected() {
        let (mgr, store) = manager();
        let empty: Vec<String> = Vec::new();
        assert!(matches!(mgr.update(&empty, &empty), Err(SnapshotError::EmptyPairs)));
        assert_eq!(store.count(SnapshotKind::RawPairs), 0);
    }

    #[test]
    fn test_listing_index_from_listed_subset() {
        let (mgr, _store) = manager();
        let all = pairs(&["BTCUSDT", "1000SATSUSDT", "DOGEUSDT"]);
        let listed = pairs(&["BTCUSDT", "1000SATSUSDT"]);

        let update = mgr.update(&all, &listed).unwrap();

        assert_eq!(update.listed_tokens, vec!["1000SATS", "BTC"]);
        assert_eq!(update.standard_tokens, vec!["BTC"]);
        assert_eq!(update.thousand_form_tokens.len(), 1);
        assert_eq!(update.listing.resolve("SATS").kind(), Some(ListingKind::ThousandX));
        assert!(!update.listing.is_listed("DOGE"));
    }

    #[test]
    fn test_listing_index_falls_back_to_all_tokens() {
        let (mgr, _store) = manager();
        let update = mgr.update(&pairs(&["BTCUSDT", "DOGEUSDT"]), &[]).unwrap();

        assert!(update.listed_tokens.is_empty());
        assert!(update.listing.is_listed("DOGE"));
    }

    struct FakeSource {
        pairs: Result<Vec<String>, ()>,
        spot: Result<Vec<String>, ()>,
    }

    #[async_trait]
    impl TradingPairSource for FakeSource {
        async fn fetch_trading_pairs(&self) -> Result<Vec<String>, FetchError> {
            self.pairs
                .clone()
                .map_err(|_| FetchError::Malformed("boom".into()))
        }

        async fn fetch_spot_pairs(&self) -> Result<Vec<String>, FetchError> {
            self.spot
                .clone()
                .map_err(|_| FetchError::Malformed("boom".into()))
        }
    }

    #[tokio::test]
    async fn test_sync_primary_failure_writes_nothing() {
        let (mgr, store) = manager();
        let source = FakeSource {
            pairs: Err(()),
            spot: Ok(pairs(&["BTCUSDT"])),
        };

        assert!(matches!(mgr.sync(&source).await, Err(SnapshotError::Fetch(_))));
        assert_eq!(store.count(SnapshotKind::RawPairs), 0);
        assert_eq!(store.count(SnapshotKind::CanonicalTokens), 0);
    }

    #[tokio::test]
    async fn test_sync_listed_failure_degrades() {
        let (mgr, _store) = manager();
        let source = FakeSource {
            pairs: Ok(pairs(&["BTCUSDT", "ETHBTC"])),
            spot: Err(()),
        };

        let update = mgr.sync(&source).await.unwrap();
        assert_eq!(update.all_tokens, vec!["BTC", "ETH"]);
        assert!(update.listed_tokens.is_empty());
        assert!(update.listing.is_listed("ETH"));
    }
}
