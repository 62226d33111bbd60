//! Platform Classifier
//!
//! Two tiers: the project's reported platform name first, then its
//! "*ecosystem*" tags. Whatever matches neither is unclassified, or lands in
//! [`OTHER_PLATFORM`] when that bucket is selected.

use super::taxonomy::{OTHER_PLATFORM, PlatformSelection, PlatformTaxonomy};
use crate::models::Project;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchReason {
    /// `platform.name` resolved through the alias lookup
    Direct,
    /// An ecosystem tag contained one of the platform's keywords
    Tag(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformMatch<'s> {
    pub platform: &'s str,
    /// Position of `platform` in the selection
    pub position: usize,
    pub reason: MatchReason,
}

#[derive(Debug, Clone)]
pub struct PlatformBucket<'a> {
    pub platform: String,
    pub projects: Vec<&'a Project>,
}

/// Buckets in selection order plus the leftovers
#[derive(Debug, Clone)]
pub struct Classification<'a> {
    pub buckets: Vec<PlatformBucket<'a>>,
    pub unclassified: Vec<&'a Project>,
}

impl<'a> Classification<'a> {
    pub fn bucket(&self, platform: &str) -> Option<&PlatformBucket<'a>> {
        self.buckets.iter().find(|b| b.platform == platform)
    }

    /// Projects in any bucket or unclassified
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.projects.len()).sum::<usize>() + self.unclassified.len()
    }
}

/// Match a single project against the selected platforms
pub fn classify_project<'s>(
    project: &Project,
    taxonomy: &PlatformTaxonomy,
    selection: &'s PlatformSelection,
) -> Option<PlatformMatch<'s>> {
    // Tier 1: reported platform name
    if let Some(canonical) = taxonomy.resolve_name(project.platform_name()) {
        if let Some((position, platform)) =
            selection.iter().enumerate().find(|(_, p)| *p == canonical)
        {
            return Some(PlatformMatch {
                platform,
                position,
                reason: MatchReason::Direct,
            });
        }
    }

    // Tier 2: ecosystem tags, tags in project order, platforms in selection order
    for tag in &project.tags {
        let tag_lower = tag.to_lowercase();
        if !tag_lower.contains("ecosystem") {
            continue;
        }
        for (position, platform) in selection.iter().enumerate() {
            let hit = taxonomy
                .keywords(platform)
                .iter()
                .any(|kw| !kw.is_empty() && tag_lower.contains(&kw.to_lowercase()));
            if hit {
                return Some(PlatformMatch {
                    platform,
                    position,
                    reason: MatchReason::Tag(tag.clone()),
                });
            }
        }
    }

    None
}

/// Partition `projects` into one bucket per selected platform.
///
/// Every project ends up in exactly one bucket or in `unclassified`.
pub fn classify<'a>(
    projects: &'a [Project],
    taxonomy: &PlatformTaxonomy,
    selection: &PlatformSelection,
) -> Classification<'a> {
    let mut buckets: Vec<PlatformBucket<'a>> = selection
        .iter()
        .map(|p| PlatformBucket {
            platform: p.to_string(),
            projects: Vec::new(),
        })
        .collect();
    let mut unclassified = Vec::new();

    for project in projects {
        match classify_project(project, taxonomy, selection) {
            Some(m) => {
                debug!(symbol = %project.symbol, platform = m.platform, reason = ?m.reason, "Classified");
                // Buckets were built from the same selection, in order
                buckets[m.position].projects.push(project);
            }
            None => unclassified.push(project),
        }
    }

    if let Some(other) = buckets.iter_mut().find(|b| b.platform == OTHER_PLATFORM) {
        other.projects.append(&mut unclassified);
    }

    for bucket in &buckets {
        info!(platform = %bucket.platform, projects = bucket.projects.len(), "Platform bucket");
    }
    if !unclassified.is_empty() {
        info!(projects = unclassified.len(), "Unclassified projects");
    }

    Classification {
        buckets,
        unclassified,
    }
}
