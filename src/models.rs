//! Market-data records as delivered by the CoinMarketCap listing API
//!
//! Projects are immutable once received: the engine only filters and
//! partitions them.

use serde::{Deserialize, Deserializer, Serialize};

/// A listed crypto project (one entry of `data.cryptoCurrencyList`)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub cmc_rank: Option<u32>,
    #[serde(default)]
    pub platform: Option<PlatformInfo>,
    /// Only string tags are kept; the provider occasionally mixes in objects
    #[serde(default, deserialize_with = "string_tags")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub quotes: Vec<Quote>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlatformInfo {
    #[serde(default)]
    pub name: String,
}

/// Price and volume figures in one conversion currency
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Quote {
    pub name: String,
    #[serde(deserialize_with = "zero_if_null")]
    pub price: f64,
    #[serde(deserialize_with = "zero_if_null")]
    pub percent_change24h: f64,
    #[serde(deserialize_with = "zero_if_null")]
    pub percent_change7d: f64,
    #[serde(deserialize_with = "zero_if_null")]
    pub percent_change30d: f64,
    #[serde(deserialize_with = "zero_if_null")]
    pub volume24h: f64,
    #[serde(deserialize_with = "zero_if_null")]
    pub volume7d: f64,
    #[serde(deserialize_with = "zero_if_null")]
    pub volume30d: f64,
    #[serde(deserialize_with = "zero_if_null")]
    pub market_cap: f64,
    #[serde(deserialize_with = "zero_if_null")]
    pub self_reported_market_cap: f64,
    // Provider spelling; the corrected spelling is accepted too
    #[serde(
        rename = "fullyDilluttedMarketCap",
        alias = "fullyDilutedMarketCap",
        deserialize_with = "zero_if_null"
    )]
    pub fully_diluted_market_cap: f64,
}

fn zero_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

fn string_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => Some(s),
            _ => None,
        })
        .collect())
}

impl Project {
    /// Reported platform name, empty when the project is a native coin
    pub fn platform_name(&self) -> &str {
        self.platform.as_ref().map(|p| p.name.as_str()).unwrap_or("")
    }

    /// USD quote: by name, else the third entry (the listing request
    /// converts to USD,BTC,ETH and the provider returns them reversed)
    pub fn usd_quote(&self) -> Option<&Quote> {
        self.quotes
            .iter()
            .find(|q| q.name == "USD")
            .or_else(|| self.quotes.get(2))
    }

    pub fn metrics(&self) -> ProjectMetrics {
        ProjectMetrics::from_project(self)
    }
}

/// Derived USD figures used by report and prompt formatting
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProjectMetrics {
    pub price: f64,
    pub percent_change_24h: f64,
    pub percent_change_7d: f64,
    pub percent_change_30d: f64,
    pub volume_24h: f64,
    pub volume_7d: f64,
    pub volume_30d: f64,
    /// Market cap, falling back to the self-reported figure when zero
    pub market_cap: f64,
    pub fdv: f64,
}

impl ProjectMetrics {
    pub fn from_project(project: &Project) -> Self {
        let Some(q) = project.usd_quote() else {
            return Self::default();
        };

        let market_cap = if q.market_cap == 0.0 {
            q.self_reported_market_cap
        } else {
            q.market_cap
        };

        Self {
            price: q.price,
            percent_change_24h: q.percent_change24h,
            percent_change_7d: q.percent_change7d,
            percent_change_30d: q.percent_change30d,
            volume_24h: q.volume24h,
            volume_7d: q.volume7d,
            volume_30d: q.volume30d,
            market_cap,
            fdv: q.fully_diluted_market_cap,
        }
    }

    /// MC/FDV, zero when FDV is unknown
    pub fn mc_fdv_ratio(&self) -> f64 {
        if self.fdv > 0.0 {
            self.market_cap / self.fdv
        } else {
            0.0
        }
    }

    /// 24h volume relative to market cap, zero when market cap is unknown
    pub fn vol_mc_ratio(&self) -> f64 {
        if self.market_cap > 0.0 {
            self.volume_24h / self.market_cap
        } else {
            0.0
        }
    }
}
