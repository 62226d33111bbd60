//! Alpha project listing (CoinMarketCap data API, `tagSlugs=binance-alpha`)

use super::{FetchError, check_status, http_client};
use crate::config::{MarketConfig, ProxyConfig};
use crate::models::Project;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const AUX_FIELDS: &str = "ath,atl,high24h,low24h,num_market_pairs,cmc_rank,date_added,tags,platform,max_supply,circulating_supply,self_reported_circulating_supply,self_reported_market_cap,total_supply,volume_7d,volume_30d";

/// One fetch of the Alpha listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaListing {
    pub fetched_at: DateTime<Utc>,
    pub total_count: u64,
    pub source: String,
    pub projects: Vec<Project>,
}

impl AlphaListing {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.fetched_at
    }
}

#[async_trait]
pub trait AlphaListingSource: Send + Sync {
    async fn fetch_listing(&self) -> Result<AlphaListing, FetchError>;
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    data: Option<ListingData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingData {
    #[serde(default)]
    crypto_currency_list: Vec<Project>,
    #[serde(default, deserialize_with = "count_from_any")]
    total_count: u64,
}

/// The provider sends `totalCount` as a string
fn count_from_any<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_u64().unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

pub struct CoinMarketCapAlpha {
    client: reqwest::Client,
    config: MarketConfig,
}

impl CoinMarketCapAlpha {
    pub fn new(config: &MarketConfig, proxy: &ProxyConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: http_client(proxy, config.timeout_secs)?,
            config: config.clone(),
        })
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("start", "1".to_string()),
            ("limit", self.config.limit.to_string()),
            ("sortBy", "market_cap".to_string()),
            ("sortType", "desc".to_string()),
            ("convert", "USD,BTC,ETH".to_string()),
            ("cryptoType", "all".to_string()),
            ("tagType", "all".to_string()),
            ("audited", "false".to_string()),
            ("aux", AUX_FIELDS.to_string()),
            ("tagSlugs", self.config.tag_slug.clone()),
        ]
    }
}

#[async_trait]
impl AlphaListingSource for CoinMarketCapAlpha {
    async fn fetch_listing(&self) -> Result<AlphaListing, FetchError> {
        info!(tag = %self.config.tag_slug, "Fetching Alpha listing");

        let response = self
            .client
            .get(&self.config.listing_url)
            .query(&self.query())
            .send()
            .await?;
        let body: ListingResponse = check_status(response)?
            .json()
            .await
            .map_err(|e| FetchError::Malformed(format!("listing: {}", e)))?;

        let data = body
            .data
            .ok_or_else(|| FetchError::Malformed("listing: missing data".to_string()))?;
        if data.crypto_currency_list.is_empty() {
            return Err(FetchError::Empty("listing"));
        }

        info!(
            projects = data.crypto_currency_list.len(),
            total = data.total_count,
            "Alpha listing received"
        );
        Ok(AlphaListing {
            fetched_at: Utc::now(),
            total_count: data.total_count,
            source: "CoinMarketCap".to_string(),
            projects: data.crypto_currency_list,
        })
    }
}

/// File cache in front of another listing source
pub struct CachedAlphaListing<S> {
    inner: S,
    path: PathBuf,
    ttl: Duration,
    force_refresh: bool,
}

impl<S: AlphaListingSource> CachedAlphaListing<S> {
    pub fn new(inner: S, path: impl AsRef<Path>, ttl_secs: i64) -> Self {
        Self {
            inner,
            path: path.as_ref().to_path_buf(),
            ttl: Duration::seconds(ttl_secs),
            force_refresh: false,
        }
    }

    /// Skip the cache and always fetch
    pub fn with_force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    /// Cached listing, if present, parseable and younger than the TTL
    pub fn fresh_cache(&self, now: DateTime<Utc>) -> Option<AlphaListing> {
        let raw = fs::read_to_string(&self.path).ok()?;
        let listing: AlphaListing = match serde_json::from_str(&raw) {
            Ok(l) => l,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable listing cache");
                return None;
            }
        };
        (listing.age(now) < self.ttl).then_some(listing)
    }

    fn store(&self, listing: &AlphaListing) -> Result<(), FetchError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(listing)
            .map_err(|e| FetchError::Malformed(format!("cache encode: {}", e)))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl<S: AlphaListingSource> AlphaListingSource for CachedAlphaListing<S> {
    async fn fetch_listing(&self) -> Result<AlphaListing, FetchError> {
        if !self.force_refresh {
            if let Some(listing) = self.fresh_cache(Utc::now()) {
                info!(
                    path = %self.path.display(),
                    fetched_at = %listing.fetched_at,
                    "Using cached Alpha listing"
                );
                return Ok(listing);
            }
        }

        let listing = self.inner.fetch_listing().await?;
        if let Err(e) = self.store(&listing) {
            warn!(path = %self.path.display(), error = %e, "Failed to write listing cache");
        }
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_body() -> serde_json::Value {
        json!({
            "data": {
                "cryptoCurrencyList": [
                    {
                        "id": 1, "name": "Alpha One", "symbol": "AONE", "cmcRank": 500,
                        "platform": {"name": "Solana"},
                        "tags": ["binance-alpha", "solana-ecosystem"],
                        "quotes": [{"name": "USD", "price": 1.5, "marketCap": 1000000.0}]
                    }
                ],
                "totalCount": "1"
            },
            "status": {"error_code": "0"}
        })
    }

    #[tokio::test]
    async fn test_fetch_listing_sends_expected_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/listing"))
            .and(query_param("tagSlugs", "binance-alpha"))
            .and(query_param("limit", "200"))
            .and(query_param("sortBy", "market_cap"))
            .and(query_param("convert", "USD,BTC,ETH"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
            .expect(1)
            .mount(&server)
            .await;

        let config = MarketConfig {
            listing_url: format!("{}/listing", server.uri()),
            ..MarketConfig::default()
        };
        let source = CoinMarketCapAlpha::new(&config, &ProxyConfig::default()).unwrap();
        let listing = source.fetch_listing().await.unwrap();

        assert_eq!(listing.total_count, 1);
        assert_eq!(listing.projects.len(), 1);
        assert_eq!(listing.projects[0].symbol, "AONE");
        assert_eq!(listing.projects[0].platform_name(), "Solana");
    }

    #[tokio::test]
    async fn test_missing_data_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": {}})))
            .mount(&server)
            .await;

        let config = MarketConfig {
            listing_url: server.uri(),
            ..MarketConfig::default()
        };
        let source = CoinMarketCapAlpha::new(&config, &ProxyConfig::default()).unwrap();
        assert!(matches!(source.fetch_listing().await, Err(FetchError::Malformed(_))));
    }

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AlphaListingSource for CountingSource {
        async fn fetch_listing(&self) -> Result<AlphaListing, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AlphaListing {
                fetched_at: Utc::now(),
                total_count: 0,
                source: "test".to_string(),
                projects: vec![Project {
                    symbol: "X".to_string(),
                    ..Project::default()
                }],
            })
        }
    }

    fn cache_path(name: &str) -> PathBuf {
        let dir = PathBuf::from(format!("target/test_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir.join("binance_alpha_data.json")
    }

    #[tokio::test]
    async fn test_cache_reused_within_ttl() {
        let path = cache_path("listing_cache");
        let cached = CachedAlphaListing::new(CountingSource { calls: AtomicUsize::new(0) }, &path, 3600);

        let first = cached.fetch_listing().await.unwrap();
        let second = cached.fetch_listing().await.unwrap();

        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert!(path.exists());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_force_refresh_and_expired_cache_refetch() {
        let path = cache_path("listing_cache_force");
        let cached = CachedAlphaListing::new(CountingSource { calls: AtomicUsize::new(0) }, &path, 3600)
            .with_force_refresh(true);
        cached.fetch_listing().await.unwrap();
        cached.fetch_listing().await.unwrap();
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);

        // TTL of zero: every cached copy is already stale
        let expired = CachedAlphaListing::new(CountingSource { calls: AtomicUsize::new(0) }, &path, 0);
        assert!(expired.fresh_cache(Utc::now()).is_none());
        expired.fetch_listing().await.unwrap();
        assert_eq!(expired.inner.calls.load(Ordering::SeqCst), 1);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_corrupt_cache_ignored() {
        let path = cache_path("listing_cache_corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        let cached = CachedAlphaListing::new(CountingSource { calls: AtomicUsize::new(0) }, &path, 3600);
        assert!(cached.fresh_cache(Utc::now()).is_none());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
