//! Blockchain platform classification of Alpha projects

pub mod classifier;
pub mod error;
pub mod taxonomy;

pub use classifier::{
    Classification, MatchReason, PlatformBucket, PlatformMatch, classify, classify_project,
};
pub use error::ClassifyError;
pub use taxonomy::{OTHER_PLATFORM, PlatformSelection, PlatformTaxonomy};
