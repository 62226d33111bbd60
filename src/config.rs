use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config yaml {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    /// Root directory for snapshots, caches, prompts and advice archives
    pub data_dir: String,
    pub proxy: ProxyConfig,
    pub exchange: ExchangeConfig,
    pub market: MarketConfig,
    pub advisor: AdvisorConfig,
    pub webhook: WebhookConfig,
    pub tokens: TokenConfig,
    pub platforms: PlatformConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "logs".to_string(),
            log_file: "alpha_scout.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            data_dir: "./data".to_string(),
            proxy: ProxyConfig::default(),
            exchange: ExchangeConfig::default(),
            market: MarketConfig::default(),
            advisor: AdvisorConfig::default(),
            webhook: WebhookConfig::default(),
            tokens: TokenConfig::default(),
            platforms: PlatformConfig::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ProxyConfig {
    pub enabled: bool,
    pub url: String,
}

impl ProxyConfig {
    /// Proxy URL if proxying is switched on and a URL is configured
    pub fn active_url(&self) -> Option<&str> {
        (self.enabled && !self.url.trim().is_empty()).then_some(self.url.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ExchangeConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct MarketConfig {
    pub listing_url: String,
    pub tag_slug: String,
    pub limit: u32,
    pub timeout_secs: u64,
    /// Cached listing is reused while younger than this
    pub cache_ttl_secs: i64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            listing_url: "https://api.coinmarketcap.com/data-api/v3/cryptocurrency/listing"
                .to_string(),
            tag_slug: "binance-alpha".to_string(),
            limit: 200,
            timeout_secs: 30,
            cache_ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AdvisorConfig {
    pub api_url: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    /// Base request timeout; every retry adds `timeout_step_secs`
    pub timeout_secs: u64,
    pub timeout_step_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Circuit breaker: stop asking after this many platforms fail in a row
    pub max_consecutive_failures: u32,
    /// Number of projects (by market cap) included in each prompt
    pub prompt_top_n: usize,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.deepseek.com/v1/chat/completions".to_string(),
            model: "deepseek-reasoner".to_string(),
            api_key: String::new(),
            temperature: 0.0,
            max_tokens: 32000,
            top_p: 1.0,
            timeout_secs: 600,
            timeout_step_secs: 300,
            max_retries: 2,
            retry_delay_ms: 2000,
            max_consecutive_failures: 3,
            prompt_top_n: 15,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct WebhookConfig {
    pub url: String,
    pub max_segment_len: usize,
    pub segment_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_segment_len: 1000,
            segment_delay_ms: 500,
            timeout_secs: 30,
        }
    }
}

/// Symbol extraction and listing-resolution settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TokenConfig {
    /// Quote-currency suffixes in priority order. The first suffix that
    /// leaves a valid token wins, regardless of suffix length.
    pub quote_currencies: Vec<String>,
    /// Exact pair → token overrides applied before suffix stripping
    pub special_cases: BTreeMap<String, String>,
    /// Literal prefix of derivative listings ("1000SATS" = 1000 x SATS)
    pub thousand_prefix: String,
}

pub const DEFAULT_QUOTE_CURRENCIES: &[&str] = &[
    "BTC", "ETH", "USDT", "BUSD", "BNB", "USDC", "EUR", "TRY", "FDUSD", "TUSD", "JPY", "ARS",
    "MXN", "BRL", "AEUR", "PLN", "RUB", "RON", "VAI", "EURI", "CZK", "COP",
];

impl Default for TokenConfig {
    fn default() -> Self {
        let special_cases = [
            ("BTCDOMUSDT", "BTCDOM"),
            ("BTCDOMBUSD", "BTCDOM"),
            ("DEFIUSDT", "DEFI"),
            ("DEFIBUSD", "DEFI"),
        ]
        .into_iter()
        .map(|(pair, token)| (pair.to_string(), token.to_string()))
        .collect();

        Self {
            quote_currencies: DEFAULT_QUOTE_CURRENCIES
                .iter()
                .map(|q| q.to_string())
                .collect(),
            special_cases,
            thousand_prefix: "1000".to_string(),
        }
    }
}

/// One platform of the taxonomy with its matchable aliases
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlatformEntry {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl PlatformEntry {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PlatformConfig {
    pub taxonomy: Vec<PlatformEntry>,
    /// Platforms to process; empty means every taxonomy platform
    pub to_query: Vec<String>,
    /// Symbols, names or CMC ids excluded before classification
    pub block_list: Vec<String>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            taxonomy: vec![
                PlatformEntry::new(
                    "BNB Chain",
                    &[
                        "BNB",
                        "BSC",
                        "BEP20",
                        "BEP-20",
                        "Binance Smart Chain",
                        "币安智能链",
                        "bnb-chain-ecosystem",
                        "binance-chain",
                    ],
                ),
                PlatformEntry::new(
                    "Solana",
                    &["SOL", "Solana", "SPL", "索拉纳", "solana-ecosystem"],
                ),
                PlatformEntry::new(
                    "Ethereum",
                    &[
                        "ETH",
                        "ERC20",
                        "Ethereum",
                        "ERC-20",
                        "ERC 20",
                        "以太坊",
                        "ethereum-ecosystem",
                    ],
                ),
            ],
            to_query: Vec::new(),
            block_list: vec!["AITECH".to_string(), "BROCCOLI".to_string()],
        }
    }
}

impl AppConfig {
    /// Load `config/<env>.yaml`
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        Self::from_file(&format!("config/{}.yaml", env))
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Apply secrets and deployment overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup (empty values are ignored)
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("WEBHOOK_URL") {
            self.webhook.url = url;
        }
        if let Some(key) = get("DEEPSEEK_API_KEY") {
            self.advisor.api_key = key;
        }
        if let Some(url) = get("DEEPSEEK_API_URL") {
            self.advisor.api_url = url;
        }
        if let Some(model) = get("DEEPSEEK_MODEL") {
            self.advisor.model = model;
        }
        if let Some(timeout) = get("DEEPSEEK_API_TIMEOUT").and_then(|t| t.parse().ok()) {
            self.advisor.timeout_secs = timeout;
        }
        let in_docker = get("IS_DOCKER").is_some_and(|flag| flag.eq_ignore_ascii_case("true"));
        if in_docker && self.proxy.url.contains("127.0.0.1") {
            self.proxy.url = self.proxy.url.replace("127.0.0.1", "host.docker.internal");
        }
    }

    /// Reject configurations the reconciliation engine cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tokens.quote_currencies.is_empty() {
            return Err(ConfigError::Invalid(
                "tokens.quote_currencies must not be empty".to_string(),
            ));
        }
        if self
            .tokens
            .quote_currencies
            .iter()
            .any(|q| q.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "tokens.quote_currencies contains an empty entry".to_string(),
            ));
        }
        if self.tokens.thousand_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "tokens.thousand_prefix must not be empty".to_string(),
            ));
        }
        if self.platforms.taxonomy.is_empty() {
            return Err(ConfigError::Invalid(
                "platforms.taxonomy must define at least one platform".to_string(),
            ));
        }

        let mut seen = Vec::with_capacity(self.platforms.taxonomy.len());
        for entry in &self.platforms.taxonomy {
            let key = entry.name.trim().to_lowercase();
            if key.is_empty() {
                return Err(ConfigError::Invalid(
                    "platforms.taxonomy contains an unnamed platform".to_string(),
                ));
            }
            if seen.contains(&key) {
                return Err(ConfigError::Invalid(format!(
                    "platform '{}' is defined more than once",
                    entry.name
                )));
            }
            seen.push(key);
        }

        Ok(())
    }
}
