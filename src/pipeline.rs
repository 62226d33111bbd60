//! End-to-end run
//!
//! ```text
//! ┌────────────┐   ┌─────────────┐   ┌──────────┐   ┌────────────┐   ┌──────────┐
//! │ token sync │──▶│ Alpha list  │──▶│ filters  │──▶│ classifier │──▶│ advisor  │
//! │ (snapshot) │   │ (cached)    │   │ listed/  │   │ per        │   │ + notify │
//! └────────────┘   └─────────────┘   │ blocked  │   │ platform   │   └──────────┘
//!                                    └──────────┘   └────────────┘
//! ```
//!
//! Every collaborator sits behind a trait so runs can be driven with fakes.

use crate::advisor::{Advisor, ChatCompletionsAdvisor, build_prompt, dry_run_notice};
use crate::archive::RunArchive;
use crate::config::AppConfig;
use crate::filter::{BlockList, retain_unlisted};
use crate::notify::{LogNotifier, Notifier, WebhookNotifier};
use crate::platform::{PlatformSelection, PlatformTaxonomy, classify};
use crate::providers::{
    AlphaListingSource, BinanceExchangeInfo, CachedAlphaListing, CoinMarketCapAlpha,
    TradingPairSource,
};
use crate::report::{
    MentionCounter, alpha_list_message, frequency_report, listing_report, token_update_summary,
};
use crate::tokens::{FileSnapshotStore, ListingIndex, SnapshotStore, TokenSnapshotManager};
use anyhow::{Context, Result};
use chrono::Local;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Listing cache file name under `data_dir`
pub const LISTING_CACHE_FILE: &str = "alpha_listing.json";
/// Snapshot directory name under `data_dir`
pub const SNAPSHOT_DIR: &str = "symbols";

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Write prompts only; no advisor requests and no listing summary push
    pub debug_only: bool,
    /// Single platform to process (debug runs only)
    pub platform: Option<String>,
    /// Bypass the listing cache
    pub force_update: bool,
    pub skip_tokens_update: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
    /// Selected platforms without any project
    pub skipped: Vec<String>,
    /// Circuit breaker tripped
    pub aborted: bool,
    pub removed_listed: usize,
    pub blocked: usize,
    pub combined_advice: Option<PathBuf>,
    pub frequency_stats: Option<PathBuf>,
}

impl RunSummary {
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

pub struct Components {
    pub pair_source: Box<dyn TradingPairSource>,
    pub listing_source: Box<dyn AlphaListingSource>,
    pub advisor: Box<dyn Advisor>,
    pub notifier: Box<dyn Notifier>,
    pub snapshot_store: Box<dyn SnapshotStore>,
}

impl Components {
    /// Production wiring: Binance, CoinMarketCap (file-cached), the chat
    /// advisor and the webhook (log only when no webhook URL is set)
    pub fn from_config(config: &AppConfig, options: &RunOptions) -> Result<Self> {
        let data_dir = Path::new(&config.data_dir);

        let pair_source = BinanceExchangeInfo::new(&config.exchange, &config.proxy)
            .context("building exchange client")?;
        let market = CoinMarketCapAlpha::new(&config.market, &config.proxy)
            .context("building market-data client")?;
        let listing_source = CachedAlphaListing::new(
            market,
            data_dir.join(LISTING_CACHE_FILE),
            config.market.cache_ttl_secs,
        )
        .with_force_refresh(options.force_update);
        let advisor = ChatCompletionsAdvisor::new(&config.advisor).context("building advisor client")?;

        let notifier: Box<dyn Notifier> = if config.webhook.url.trim().is_empty() {
            warn!("No webhook URL configured, messages go to the log only");
            Box::new(LogNotifier)
        } else {
            Box::new(
                WebhookNotifier::new(&config.webhook, &config.proxy)
                    .context("building webhook client")?,
            )
        };

        Ok(Self {
            pair_source: Box::new(pair_source),
            listing_source: Box::new(listing_source),
            advisor: Box::new(advisor),
            notifier,
            snapshot_store: Box::new(FileSnapshotStore::new(data_dir.join(SNAPSHOT_DIR))),
        })
    }
}

pub struct Pipeline {
    config: AppConfig,
    pair_source: Box<dyn TradingPairSource>,
    listing_source: Box<dyn AlphaListingSource>,
    advisor: Box<dyn Advisor>,
    notifier: Box<dyn Notifier>,
    tokens: TokenSnapshotManager,
    taxonomy: PlatformTaxonomy,
    archive: RunArchive,
}

impl Pipeline {
    pub fn new(config: AppConfig, components: Components) -> Result<Self> {
        let taxonomy = PlatformTaxonomy::from_entries(&config.platforms.taxonomy)
            .context("invalid platform taxonomy")?;
        let tokens = TokenSnapshotManager::new(components.snapshot_store, &config.tokens);
        let archive = RunArchive::new(&config.data_dir);

        Ok(Self {
            config,
            pair_source: components.pair_source,
            listing_source: components.listing_source,
            advisor: components.advisor,
            notifier: components.notifier,
            tokens,
            taxonomy,
            archive,
        })
    }

    /// Token sync. Failures are logged and the run continues without a
    /// listing index (nothing is filtered as listed).
    async fn sync_tokens(&self) -> Option<ListingIndex> {
        match self.tokens.sync(self.pair_source.as_ref()).await {
            Ok(update) => {
                info!("{}", token_update_summary(&update));
                info!(
                    "{}",
                    listing_report(&update.standard_tokens, &update.thousand_form_tokens)
                );
                Some(update.listing)
            }
            Err(e) => {
                error!(error = %e, "Token sync failed, continuing without listing filter");
                None
            }
        }
    }

    /// `--platform` is honoured only in debug runs, and must name a known
    /// platform.
    fn selection(&self, options: &RunOptions) -> Result<PlatformSelection> {
        match (&options.platform, options.debug_only) {
            (Some(platform), true) => PlatformSelection::strict(&self.taxonomy, std::slice::from_ref(platform))
                .with_context(|| format!("invalid --platform '{}'", platform)),
            (Some(platform), false) => {
                warn!(platform = %platform, "--platform is ignored outside debug runs");
                Ok(PlatformSelection::resolve(&self.taxonomy, &self.config.platforms.to_query))
            }
            (None, _) => Ok(PlatformSelection::resolve(&self.taxonomy, &self.config.platforms.to_query)),
        }
    }

    /// Count project mentions over every archived combined advice file
    fn frequency_stats(&self, index: Option<&ListingIndex>, date: &str) -> Result<PathBuf> {
        let mut counter = MentionCounter::new().context("compiling mention pattern")?;
        for document in self
            .archive
            .read_combined_advice()
            .context("reading combined advice")?
        {
            counter.add_document(&document);
        }
        let counts = counter.finish(index);

        let path = self
            .archive
            .write_frequency_stats(&frequency_report(&counts, date))
            .context("archiving frequency stats")?;
        info!(projects = counts.len(), path = %path.display(), "Recommendation frequency stats saved");
        Ok(path)
    }

    pub async fn run(&self, options: &RunOptions) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        // 1. Exchange token reconciliation
        let listing_index = if options.skip_tokens_update {
            info!("Skipping trading pair update");
            None
        } else {
            self.sync_tokens().await
        };

        // 2. Alpha listing
        let listing = self
            .listing_source
            .fetch_listing()
            .await
            .context("fetching Binance Alpha listing")?;
        let date = listing.fetched_at.with_timezone(&Local).format("%Y-%m-%d").to_string();
        info!(
            projects = listing.projects.len(),
            total = listing.total_count,
            source = %listing.source,
            "Alpha listing ready"
        );
        if let Some(index) = &listing_index {
            let listed = listing
                .projects
                .iter()
                .filter(|p| !p.symbol.is_empty() && index.is_listed(&p.symbol))
                .count();
            info!(listed, "Alpha projects already on Binance spot");
        }

        if !options.debug_only {
            let message = alpha_list_message(&listing, listing_index.as_ref());
            if let Err(e) = self.notifier.send_text(&message).await {
                warn!(error = %e, "Failed to push Alpha listing summary");
            }
        }

        // 3. Filters
        let mut projects = listing.projects;
        if let Some(index) = &listing_index {
            let (kept, removed) = retain_unlisted(projects, index);
            projects = kept;
            summary.removed_listed = removed;
        } else {
            info!(projects = projects.len(), "No listing index, keeping every Alpha project");
        }
        let (kept, blocked) = BlockList::new(&self.config.platforms.block_list).apply(projects);
        projects = kept;
        summary.blocked = blocked;

        let now = Local::now().naive_local();
        self.archive
            .write_filtered(&projects, now)
            .context("archiving filtered project list")?;

        // 4. Classification
        let selection = self.selection(options)?;
        info!(
            platforms = %selection.iter().collect::<Vec<_>>().join(", "),
            "Processing platforms"
        );
        let classification = classify(&projects, &self.taxonomy, &selection);
        self.archive
            .write_platform_buckets(&classification, now)
            .context("archiving platform buckets")?;

        // 5. Advice per platform
        let max_failures = self.config.advisor.max_consecutive_failures.max(1);
        let mut consecutive_failures = 0u32;
        let mut combined = format!(
            "# Binance Alpha listing candidates by platform ({})\n\n",
            date
        );

        for bucket in &classification.buckets {
            let platform = bucket.platform.as_str();
            if bucket.projects.is_empty() {
                info!(platform, "No projects, skipping");
                summary.skipped.push(platform.to_string());
                continue;
            }
            info!(platform, projects = bucket.projects.len(), "Requesting advice");

            let prompt = build_prompt(
                platform,
                &date,
                &bucket.projects,
                self.config.advisor.prompt_top_n,
            );
            let prompt_path = self
                .archive
                .write_prompt(platform, &prompt, Local::now().naive_local())
                .context("archiving prompt")?;

            let advice = if options.debug_only {
                Ok(dry_run_notice(platform, &prompt_path))
            } else {
                self.advisor.advise(platform, &prompt).await.map(|a| a.text)
            };

            match advice {
                Ok(text) => {
                    if let Err(e) = self.notifier.send_text(&text).await {
                        warn!(platform, error = %e, "Failed to deliver advice");
                    }
                    let path = self
                        .archive
                        .write_advice(platform, &text, Local::now().naive_local())
                        .context("archiving advice")?;
                    info!(platform, path = %path.display(), "Advice saved");

                    let _ = write!(combined, "## {}\n\n{}\n\n---\n\n", platform, text);
                    summary.succeeded.push(platform.to_string());
                    consecutive_failures = 0;
                }
                Err(e) => {
                    error!(platform, error = %e, "Advice failed");
                    summary.failed.push(platform.to_string());
                    consecutive_failures += 1;
                    if consecutive_failures >= max_failures {
                        error!(
                            consecutive_failures,
                            "Too many consecutive failures, stopping platform processing"
                        );
                        summary.aborted = true;
                        break;
                    }
                }
            }
        }

        if !summary.succeeded.is_empty() {
            let path = self
                .archive
                .write_combined_advice(&combined, Local::now().naive_local())
                .context("archiving combined advice")?;
            info!(path = %path.display(), "Combined advice saved");
            summary.combined_advice = Some(path);

            match self.frequency_stats(listing_index.as_ref(), &date) {
                Ok(path) => summary.frequency_stats = Some(path),
                Err(e) => warn!(error = %e, "Failed to update recommendation frequency stats"),
            }
        }

        info!(
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            skipped = summary.skipped.len(),
            aborted = summary.aborted,
            "Run finished"
        );
        Ok(summary)
    }
}
