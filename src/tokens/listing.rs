//! Listing Status Resolver
//!
//! Exchanges list some low-priced tokens in a scaled form ("1000SATS" is
//! 1000 SATS). A project reporting symbol "SATS" is therefore already listed
//! even though no "SATS" pair exists.

use super::{is_token_shape, normalize_token};
use crate::config::TokenConfig;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingKind {
    #[serde(rename = "standard")]
    Standard,
    #[serde(rename = "1000x")]
    ThousandX,
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingKind::Standard => write!(f, "standard"),
            ListingKind::ThousandX => write!(f, "1000x"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingStatus {
    Listed { kind: ListingKind, listed_as: String },
    NotListed,
}

impl ListingStatus {
    pub fn is_listed(&self) -> bool {
        matches!(self, ListingStatus::Listed { .. })
    }

    pub fn kind(&self) -> Option<ListingKind> {
        match self {
            ListingStatus::Listed { kind, .. } => Some(*kind),
            ListingStatus::NotListed => None,
        }
    }

    pub fn listed_as(&self) -> Option<&str> {
        match self {
            ListingStatus::Listed { listed_as, .. } => Some(listed_as),
            ListingStatus::NotListed => None,
        }
    }
}

/// A scaled listing: `full_symbol` = prefix + `real_token`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ThousandFormToken {
    pub full_symbol: String,
    pub real_token: String,
}

impl ThousandFormToken {
    /// Recognise `token` as a scaled listing. The remainder after the prefix
    /// must start with a letter ("1000000MOG" is not "000MOG") and must not be
    /// a quote currency ("1000USDT" is a plain token).
    pub fn parse(token: &str, prefix: &str, quotes: &FxHashSet<String>) -> Option<Self> {
        let real = token.strip_prefix(prefix)?;
        let starts_with_letter = real.bytes().next().is_some_and(|b| b.is_ascii_uppercase());
        if !starts_with_letter || !is_token_shape(real) || quotes.contains(real) {
            return None;
        }
        Some(Self {
            full_symbol: token.to_string(),
            real_token: real.to_string(),
        })
    }
}

/// Split exchange-listed tokens into standard and scaled forms.
///
/// Output is sorted and deduplicated.
pub fn partition_listed<I, S>(tokens: I, config: &TokenConfig) -> (Vec<String>, Vec<ThousandFormToken>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let quotes: FxHashSet<String> = config
        .quote_currencies
        .iter()
        .map(|q| normalize_token(q))
        .collect();
    let prefix = normalize_token(&config.thousand_prefix);

    let mut standard = Vec::new();
    let mut thousand = Vec::new();

    for raw in tokens {
        let token = normalize_token(raw.as_ref());
        if token.is_empty() {
            continue;
        }
        match ThousandFormToken::parse(&token, &prefix, &quotes) {
            Some(t) => thousand.push(t),
            None => standard.push(token),
        }
    }

    standard.sort();
    standard.dedup();
    thousand.sort();
    thousand.dedup();
    (standard, thousand)
}

/// Lookup tables for listing resolution, built once per run
#[derive(Debug, Clone, Default)]
pub struct ListingIndex {
    standard: FxHashSet<String>,
    thousand_by_real: FxHashMap<String, String>,
    thousand_full: FxHashSet<String>,
}

impl ListingIndex {
    pub fn new<I, J>(standard: I, thousand: J) -> Self
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = ThousandFormToken>,
    {
        let standard = standard.into_iter().map(|t| normalize_token(&t)).collect();
        let mut thousand_by_real = FxHashMap::default();
        let mut thousand_full = FxHashSet::default();
        for t in thousand {
            let full = normalize_token(&t.full_symbol);
            thousand_by_real
                .entry(normalize_token(&t.real_token))
                .or_insert_with(|| full.clone());
            thousand_full.insert(full);
        }
        Self {
            standard,
            thousand_by_real,
            thousand_full,
        }
    }

    /// Build from a flat token list, partitioning it with `config`
    pub fn from_tokens<I, S>(tokens: I, config: &TokenConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (standard, thousand) = partition_listed(tokens, config);
        Self::new(standard, thousand)
    }

    pub fn standard_count(&self) -> usize {
        self.standard.len()
    }

    pub fn thousand_count(&self) -> usize {
        self.thousand_full.len()
    }

    pub fn is_empty(&self) -> bool {
        self.standard.is_empty() && self.thousand_full.is_empty()
    }

    /// Detailed resolution: standard form first, then scaled form.
    pub fn resolve(&self, token: &str) -> ListingStatus {
        let token = normalize_token(token);
        if token.is_empty() {
            return ListingStatus::NotListed;
        }

        if self.standard.contains(&token) {
            return ListingStatus::Listed {
                kind: ListingKind::Standard,
                listed_as: token,
            };
        }

        if let Some(full) = self.thousand_by_real.get(&token) {
            return ListingStatus::Listed {
                kind: ListingKind::ThousandX,
                listed_as: full.clone(),
            };
        }

        if self.thousand_full.contains(&token) {
            return ListingStatus::Listed {
                kind: ListingKind::ThousandX,
                listed_as: token,
            };
        }

        ListingStatus::NotListed
    }

    /// Bulk filter path. Consults the same tables as [`resolve`](Self::resolve)
    /// without building a status value.
    pub fn is_listed(&self, token: &str) -> bool {
        let token = normalize_token(token);
        !token.is_empty()
            && (self.standard.contains(&token)
                || self.thousand_by_real.contains_key(&token)
                || self.thousand_full.contains(&token))
    }
}
