//! Pre-classification project filters

use crate::models::Project;
use crate::tokens::ListingIndex;
use rustc_hash::FxHashSet;
use tracing::info;

/// Drop projects whose symbol is already listed on the exchange.
///
/// Projects without a symbol are kept. Returns the kept projects and the
/// number removed.
pub fn retain_unlisted(projects: Vec<Project>, listing: &ListingIndex) -> (Vec<Project>, usize) {
    let before = projects.len();
    let kept: Vec<Project> = projects
        .into_iter()
        .filter(|p| p.symbol.trim().is_empty() || !listing.is_listed(&p.symbol))
        .collect();
    let removed = before - kept.len();

    info!(removed, remaining = kept.len(), "Removed already-listed projects");
    (kept, removed)
}

/// Operator-maintained exclusions, matched against symbol, name or id
#[derive(Debug, Clone, Default)]
pub struct BlockList {
    entries: FxHashSet<String>,
}

impl BlockList {
    pub fn new<S: AsRef<str>>(entries: &[S]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|e| e.as_ref().trim().to_uppercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_blocked(&self, project: &Project) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        self.entries.contains(&project.symbol.to_uppercase())
            || self.entries.contains(&project.name.to_uppercase())
            || self.entries.contains(&project.id.to_string())
    }

    pub fn apply(&self, projects: Vec<Project>) -> (Vec<Project>, usize) {
        let before = projects.len();
        let kept: Vec<Project> = projects.into_iter().filter(|p| !self.is_blocked(p)).collect();
        let blocked = before - kept.len();
        if blocked > 0 {
            info!(blocked, "Filtered block-listed projects");
        }
        (kept, blocked)
    }
}
