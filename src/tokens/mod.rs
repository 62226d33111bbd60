//! Token reconciliation
//!
//! Turns raw exchange trading pairs into canonical base tokens, tracks them
//! across runs with versioned snapshots, and answers "is this token already
//! listed?" including the numeric-prefix ("1000SATS") convention.
//!
//! ```text
//! raw pairs ──▶ SymbolExtractor ──▶ canonical set ──▶ TokenSnapshotManager
//!                                                        │ (diff vs store)
//!                                                        ▼
//!                                 ListingIndex ◀── listed subset (fresh)
//! ```

pub mod error;
pub mod extractor;
pub mod listing;
pub mod snapshot;
pub mod store;

pub use error::{SnapshotError, StoreError};
pub use extractor::SymbolExtractor;
pub use listing::{ListingIndex, ListingKind, ListingStatus, ThousandFormToken};
pub use snapshot::{SnapshotState, TokenSnapshotManager, TokenUpdate};
pub use store::{FileSnapshotStore, MemorySnapshotStore, SnapshotKind, SnapshotStore, TokenSnapshot};

/// Canonical identity of a token: trimmed, ASCII-uppercase
pub fn normalize_token(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// `[A-Z0-9]+`
pub fn is_token_shape(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Split `<digits><letters>` into its two halves, e.g. "1000SATS" → ("1000", "SATS")
pub fn split_numeric_prefix(s: &str) -> Option<(&str, &str)> {
    let digits = s.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 || digits == s.len() {
        return None;
    }
    let (prefix, rest) = s.split_at(digits);
    rest.bytes()
        .all(|b| b.is_ascii_uppercase())
        .then_some((prefix, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("  sats "), "SATS");
        assert_eq!(normalize_token(""), "");
    }

    #[test]
    fn test_is_token_shape() {
        assert!(is_token_shape("BTC"));
        assert!(is_token_shape("1000SATS"));
        assert!(!is_token_shape(""));
        assert!(!is_token_shape("btc"));
        assert!(!is_token_shape("BTC_USDT"));
        assert!(!is_token_shape("BTC-USDT"));
    }

    #[test]
    fn test_split_numeric_prefix() {
        assert_eq!(split_numeric_prefix("1000SATS"), Some(("1000", "SATS")));
        assert_eq!(split_numeric_prefix("1MBABYDOGE"), Some(("1", "MBABYDOGE")));
        assert_eq!(split_numeric_prefix("1000"), None);
        assert_eq!(split_numeric_prefix("SATS"), None);
        assert_eq!(split_numeric_prefix("1000SATS2"), None);
    }
}
