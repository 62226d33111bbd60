//! Upstream data sources
//!
//! - [`exchange`]: trading pairs from the spot exchange
//! - [`alpha`]: the Alpha project listing from the market-data provider

pub mod alpha;
pub mod error;
pub mod exchange;

pub use alpha::{AlphaListing, AlphaListingSource, CachedAlphaListing, CoinMarketCapAlpha};
pub use error::FetchError;
pub use exchange::{BinanceExchangeInfo, TradingPairSource, TradingPairs};

use crate::config::ProxyConfig;
use std::time::Duration;
use tracing::info;

const USER_AGENT: &str = concat!("alpha_scout/", env!("CARGO_PKG_VERSION"));

/// Shared client construction: timeout and optional proxy
pub fn http_client(proxy: &ProxyConfig, timeout_secs: u64) -> Result<reqwest::Client, FetchError> {
    let mut builder = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT);

    if let Some(url) = proxy.active_url() {
        info!(proxy = url, "Using HTTP proxy");
        builder = builder.proxy(reqwest::Proxy::all(url)?);
    }

    Ok(builder.build()?)
}

/// Map non-2xx responses to [`FetchError::Status`]
pub(crate) fn check_status(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(FetchError::Status {
            url: response.url().to_string(),
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_builds_with_and_without_proxy() {
        assert!(http_client(&ProxyConfig::default(), 5).is_ok());

        let proxy = ProxyConfig {
            enabled: true,
            url: "http://127.0.0.1:7890".to_string(),
        };
        assert!(http_client(&proxy, 5).is_ok());
    }
}
