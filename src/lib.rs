//! alpha_scout - Binance Alpha listing scout
//!
//! Reconciles the exchange's trading pairs into canonical tokens, drops Alpha
//! projects that are already listed, groups the rest by blockchain platform
//! and asks an LLM which of them are most likely to be listed next.
//!
//! # Modules
//!
//! - [`config`] - YAML configuration with environment overrides
//! - [`logging`] - tracing subscriber setup
//! - [`models`] - Market-data project records
//! - [`tokens`] - Symbol extraction, listing resolution, token snapshots
//! - [`providers`] - Exchange and market-data HTTP sources
//! - [`platform`] - Platform taxonomy and classifier
//! - [`filter`] - Listed / block-list project filters
//! - [`report`] - Human-readable summaries
//! - [`advisor`] - Prompt building and the chat-completions advisor
//! - [`notify`] - Webhook delivery
//! - [`archive`] - Run artifacts on disk
//! - [`pipeline`] - End-to-end run

pub mod config;
pub mod logging;
pub mod models;

// Reconciliation core
pub mod platform;
pub mod tokens;

// I/O around the core
pub mod advisor;
pub mod archive;
pub mod filter;
pub mod notify;
pub mod pipeline;
pub mod providers;
pub mod report;

// Convenient re-exports at crate root
pub use config::{AppConfig, ConfigError};
pub use models::{Project, ProjectMetrics};
pub use pipeline::{Components, Pipeline, RunOptions, RunSummary};
pub use platform::{Classification, PlatformSelection, PlatformTaxonomy, classify};
pub use tokens::{
    ListingIndex, ListingKind, ListingStatus, SymbolExtractor, TokenSnapshotManager, TokenUpdate,
};
