use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("Platform taxonomy is empty")]
    EmptyTaxonomy,

    #[error("Platform declared twice in taxonomy: {0}")]
    DuplicatePlatform(String),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Platform selected twice: {0}")]
    DuplicateSelection(String),
}
