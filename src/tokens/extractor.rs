//! Symbol Extractor
//!
//! Raw exchange pairs carry no delimiter ("ETHUSDT"), so the base token is
//! recovered by stripping a known quote currency. Quote currencies are tried
//! in configured order: the order is the tie-break, not suffix length.

use super::{is_token_shape, normalize_token, split_numeric_prefix};
use crate::config::TokenConfig;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SymbolExtractor {
    quote_currencies: Vec<String>,
    quote_set: FxHashSet<String>,
    special_cases: FxHashMap<String, String>,
}

impl SymbolExtractor {
    pub fn new(config: &TokenConfig) -> Self {
        let quote_currencies: Vec<String> = config
            .quote_currencies
            .iter()
            .map(|q| normalize_token(q))
            .filter(|q| !q.is_empty())
            .collect();
        let quote_set = quote_currencies.iter().cloned().collect();
        let special_cases = config
            .special_cases
            .iter()
            .map(|(pair, token)| (normalize_token(pair), normalize_token(token)))
            .collect();

        Self {
            quote_currencies,
            quote_set,
            special_cases,
        }
    }

    pub fn quote_currencies(&self) -> &[String] {
        &self.quote_currencies
    }

    pub fn is_quote_currency(&self, s: &str) -> bool {
        self.quote_set.contains(s)
    }

    /// Strip the first quote currency (in priority order) that leaves a
    /// valid token. `pair` must already be normalized.
    pub fn strip_quote<'a>(&self, pair: &'a str) -> Option<&'a str> {
        self.quote_currencies.iter().find_map(|quote| {
            pair.strip_suffix(quote.as_str())
                .filter(|base| is_token_shape(base))
        })
    }

    /// Extract the canonical token set from raw trading pairs.
    ///
    /// Empty and malformed pairs are dropped silently.
    pub fn extract<I, S>(&self, pairs: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tokens = BTreeSet::new();
        let mut unmatched = Vec::new();

        for raw in pairs {
            let pair = normalize_token(raw.as_ref());
            if pair.is_empty() {
                continue;
            }

            if let Some(token) = self.special_cases.get(&pair) {
                tokens.insert(token.clone());
                continue;
            }

            match self.strip_quote(&pair) {
                Some(base) => {
                    tokens.insert(base.to_string());
                }
                None => unmatched.push(pair),
            }
        }

        if !unmatched.is_empty() {
            let preview: Vec<&str> = unmatched.iter().take(10).map(String::as_str).collect();
            info!(
                unmatched = unmatched.len(),
                "Pairs without a quote suffix: {}{}",
                preview.join(", "),
                if unmatched.len() > 10 { ", ..." } else { "" }
            );
        }

        for pair in &unmatched {
            self.fallback(pair, &mut tokens);
        }

        debug!(tokens = tokens.len(), "Extracted canonical tokens");
        tokens
    }

    /// Second pass for pairs without a recognised quote suffix: keep the pair
    /// itself, and for "<digits><letters>" also the embedded real token.
    fn fallback(&self, pair: &str, tokens: &mut BTreeSet<String>) {
        if !is_token_shape(pair) {
            return;
        }

        if !self.is_quote_currency(pair) {
            tokens.insert(pair.to_string());
        }

        if let Some((_, letters)) = split_numeric_prefix(pair) {
            if !self.is_quote_currency(letters) {
                tokens.insert(letters.to_string());
            }
        }
    }
}
