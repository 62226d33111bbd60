//! Spot exchange trading pairs (`GET /api/v3/exchangeInfo`)

use super::{FetchError, check_status, http_client};
use crate::config::{ExchangeConfig, ProxyConfig};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

/// Both pair lists, taken from one exchange response where possible
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradingPairs {
    pub all: Vec<String>,
    pub trading: Vec<String>,
}

#[async_trait]
pub trait TradingPairSource: Send + Sync {
    /// Every symbol the exchange reports, whatever its trading status
    async fn fetch_trading_pairs(&self) -> Result<Vec<String>, FetchError>;

    /// Pairs currently open for trading. Used for the listing index.
    async fn fetch_spot_pairs(&self) -> Result<Vec<String>, FetchError> {
        self.fetch_trading_pairs().await
    }

    /// Fetch both lists. A failed `all` fetch is an error; a failed
    /// `trading` fetch degrades to an empty list.
    async fn fetch_pairs(&self) -> Result<TradingPairs, FetchError> {
        let all = self.fetch_trading_pairs().await?;
        let trading = match self.fetch_spot_pairs().await {
            Ok(trading) => trading,
            Err(e) => {
                warn!(error = %e, "Listed pair fetch failed, continuing without it");
                Vec::new()
            }
        };
        Ok(TradingPairs { all, trading })
    }
}

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    #[serde(default)]
    symbols: Vec<SymbolEntry>,
}

#[derive(Debug, Deserialize)]
struct SymbolEntry {
    symbol: String,
    #[serde(default)]
    status: String,
}

pub struct BinanceExchangeInfo {
    client: reqwest::Client,
    url: String,
}

impl BinanceExchangeInfo {
    pub fn new(config: &ExchangeConfig, proxy: &ProxyConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: http_client(proxy, config.timeout_secs)?,
            url: format!("{}/api/v3/exchangeInfo", config.base_url.trim_end_matches('/')),
        })
    }

    async fn exchange_info(&self) -> Result<ExchangeInfo, FetchError> {
        let response = check_status(self.client.get(&self.url).send().await?)?;
        let info: ExchangeInfo = response
            .json()
            .await
            .map_err(|e| FetchError::Malformed(format!("exchangeInfo: {}", e)))?;

        if info.symbols.is_empty() {
            return Err(FetchError::Empty("exchangeInfo"));
        }
        debug!(symbols = info.symbols.len(), "exchangeInfo received");
        Ok(info)
    }
}

impl ExchangeInfo {
    fn trading(&self) -> Vec<String> {
        self.symbols
            .iter()
            .filter(|s| s.status == "TRADING")
            .map(|s| s.symbol.clone())
            .collect()
    }

    fn into_all(self) -> Vec<String> {
        self.symbols.into_iter().map(|s| s.symbol).collect()
    }
}

#[async_trait]
impl TradingPairSource for BinanceExchangeInfo {
    async fn fetch_trading_pairs(&self) -> Result<Vec<String>, FetchError> {
        Ok(self.exchange_info().await?.into_all())
    }

    async fn fetch_spot_pairs(&self) -> Result<Vec<String>, FetchError> {
        Ok(self.exchange_info().await?.trading())
    }

    async fn fetch_pairs(&self) -> Result<TradingPairs, FetchError> {
        let info = self.exchange_info().await?;
        let trading = info.trading();
        Ok(TradingPairs {
            all: info.into_all(),
            trading,
        })
    }
}
