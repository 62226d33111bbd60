//! Platform taxonomy and selection

use super::error::ClassifyError;
use crate::config::PlatformEntry;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::warn;

/// Catch-all bucket. Selectable even when the taxonomy does not declare it.
pub const OTHER_PLATFORM: &str = "Other";

/// Ordered platforms with a case-insensitive alias lookup
#[derive(Debug, Clone)]
pub struct PlatformTaxonomy {
    entries: Vec<PlatformEntry>,
    /// lowercase keyword or name → index into `entries`
    lookup: FxHashMap<String, usize>,
}

impl PlatformTaxonomy {
    pub fn from_entries(entries: &[PlatformEntry]) -> Result<Self, ClassifyError> {
        if entries.is_empty() {
            return Err(ClassifyError::EmptyTaxonomy);
        }

        let mut seen = FxHashSet::default();
        for entry in entries {
            if !seen.insert(entry.name.to_lowercase()) {
                return Err(ClassifyError::DuplicatePlatform(entry.name.clone()));
            }
        }

        let mut lookup: FxHashMap<String, usize> = FxHashMap::default();
        for (idx, entry) in entries.iter().enumerate() {
            for keyword in &entry.keywords {
                let key = keyword.trim().to_lowercase();
                if key.is_empty() {
                    continue;
                }
                if let Some(&owner) = lookup.get(&key) {
                    if owner != idx {
                        warn!(
                            keyword = %keyword,
                            kept = %entries[owner].name,
                            ignored = %entry.name,
                            "Keyword declared by two platforms"
                        );
                    }
                    continue;
                }
                lookup.insert(key, idx);
            }
        }
        // Canonical names always resolve to themselves
        for (idx, entry) in entries.iter().enumerate() {
            lookup.insert(entry.name.to_lowercase(), idx);
        }

        Ok(Self {
            entries: entries.to_vec(),
            lookup,
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keywords of `platform`; empty for unknown platforms
    pub fn keywords(&self, platform: &str) -> &[String] {
        self.entries
            .iter()
            .find(|e| e.name == platform)
            .map(|e| e.keywords.as_slice())
            .unwrap_or(&[])
    }

    /// Map a reported platform name, keyword or canonical name to the
    /// canonical platform name.
    pub fn resolve_name(&self, raw: &str) -> Option<&str> {
        let key = raw.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }
        self.lookup.get(&key).map(|&idx| self.entries[idx].name.as_str())
    }

    /// Canonical spelling of a platform name, case-insensitively. Accepts
    /// [`OTHER_PLATFORM`] even when undeclared.
    pub fn canonical(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        if let Some(entry) = self.entries.iter().find(|e| e.name.eq_ignore_ascii_case(name)) {
            return Some(entry.name.as_str());
        }
        name.eq_ignore_ascii_case(OTHER_PLATFORM).then_some(OTHER_PLATFORM)
    }
}

/// Platforms to process, in processing order. Never empty, never duplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSelection {
    platforms: Vec<String>,
}

impl PlatformSelection {
    pub fn all(taxonomy: &PlatformTaxonomy) -> Self {
        Self {
            platforms: taxonomy.names().map(str::to_string).collect(),
        }
    }

    /// Lenient: unknown and duplicate names are dropped with a warning; an
    /// empty result means every taxonomy platform.
    pub fn resolve<S: AsRef<str>>(taxonomy: &PlatformTaxonomy, requested: &[S]) -> Self {
        if requested.is_empty() {
            return Self::all(taxonomy);
        }

        let mut platforms: Vec<String> = Vec::new();
        for name in requested {
            let name = name.as_ref();
            match taxonomy.canonical(name) {
                Some(canonical) if platforms.iter().any(|p| p == canonical) => {
                    warn!(platform = name, "Duplicate platform selection dropped");
                }
                Some(canonical) => platforms.push(canonical.to_string()),
                None => warn!(platform = name, "Unknown platform dropped from selection"),
            }
        }

        if platforms.is_empty() {
            warn!("No valid platform selected, processing all platforms");
            return Self::all(taxonomy);
        }
        Self { platforms }
    }

    /// Strict: any unknown or duplicate name is an error.
    pub fn strict<S: AsRef<str>>(
        taxonomy: &PlatformTaxonomy,
        requested: &[S],
    ) -> Result<Self, ClassifyError> {
        if requested.is_empty() {
            return Ok(Self::all(taxonomy));
        }

        let mut platforms: Vec<String> = Vec::new();
        for name in requested {
            let name = name.as_ref();
            let canonical = taxonomy
                .canonical(name)
                .ok_or_else(|| ClassifyError::UnknownPlatform(name.to_string()))?;
            if platforms.iter().any(|p| p == canonical) {
                return Err(ClassifyError::DuplicateSelection(name.to_string()));
            }
            platforms.push(canonical.to_string());
        }
        Ok(Self { platforms })
    }

    pub fn contains(&self, platform: &str) -> bool {
        self.platforms.iter().any(|p| p == platform)
    }

    pub fn includes_other(&self) -> bool {
        self.contains(OTHER_PLATFORM)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.platforms.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformConfig;

    fn taxonomy() -> PlatformTaxonomy {
        PlatformTaxonomy::from_entries(&PlatformConfig::default().taxonomy).unwrap()
    }

    #[test]
    fn test_resolve_name_case_insensitive() {
        let t = taxonomy();
        assert_eq!(t.resolve_name("bep20"), Some("BNB Chain"));
        assert_eq!(t.resolve_name("  SOLANA "), Some("Solana"));
        assert_eq!(t.resolve_name("ethereum-ecosystem"), Some("Ethereum"));
        assert_eq!(t.resolve_name("Tron"), None);
        assert_eq!(t.resolve_name(""), None);
    }

    #[test]
    fn test_first_keyword_owner_wins_and_names_override() {
        let t = PlatformTaxonomy::from_entries(&[
            PlatformEntry::new("Base", &["L2", "optimism"]),
            PlatformEntry::new("Optimism", &["L2"]),
        ])
        .unwrap();

        assert_eq!(t.resolve_name("l2"), Some("Base"));
        // "optimism" is Base's keyword but Optimism's canonical name
        assert_eq!(t.resolve_name("Optimism"), Some("Optimism"));
    }

    #[test]
    fn test_invalid_taxonomies() {
        assert_eq!(
            PlatformTaxonomy::from_entries(&[]).unwrap_err(),
            ClassifyError::EmptyTaxonomy
        );
        assert_eq!(
            PlatformTaxonomy::from_entries(&[
                PlatformEntry::new("Solana", &[]),
                PlatformEntry::new("solana", &[]),
            ])
            .unwrap_err(),
            ClassifyError::DuplicatePlatform("solana".to_string())
        );
    }

    #[test]
    fn test_lenient_selection() {
        let t = taxonomy();

        let empty: [&str; 0] = [];
        let all = PlatformSelection::resolve(&t, &empty);
        assert_eq!(all.iter().collect::<Vec<_>>(), vec!["BNB Chain", "Solana", "Ethereum"]);

        let sel = PlatformSelection::resolve(&t, &["ethereum", "Tron", "Ethereum", "solana"]);
        assert_eq!(sel.iter().collect::<Vec<_>>(), vec!["Ethereum", "Solana"]);

        // Nothing valid: fall back to everything
        let sel = PlatformSelection::resolve(&t, &["Tron"]);
        assert_eq!(sel, PlatformSelection::all(&t));
    }

    #[test]
    fn test_other_is_selectable() {
        let t = taxonomy();
        let sel = PlatformSelection::resolve(&t, &["Solana", "other"]);
        assert!(sel.includes_other());
        assert_eq!(sel.len(), 2);
        assert!(!PlatformSelection::all(&t).includes_other());
    }

    #[test]
    fn test_strict_selection() {
        let t = taxonomy();
        assert_eq!(
            PlatformSelection::strict(&t, &["Solana", "Tron"]).unwrap_err(),
            ClassifyError::UnknownPlatform("Tron".to_string())
        );
        assert_eq!(
            PlatformSelection::strict(&t, &["Solana", "SOLANA"]).unwrap_err(),
            ClassifyError::DuplicateSelection("SOLANA".to_string())
        );
        let sel = PlatformSelection::strict(&t, &["bnb chain"]).unwrap();
        assert_eq!(sel.iter().collect::<Vec<_>>(), vec!["BNB Chain"]);
    }

    #[test]
    fn test_keywords_lookup() {
        let t = taxonomy();
        assert!(t.keywords("Solana").iter().any(|k| k == "SPL"));
        assert!(t.keywords(OTHER_PLATFORM).is_empty());
    }
}
