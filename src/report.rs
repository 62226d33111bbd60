//! Human-readable messages: listing summaries, prompt project lines, the
//! exchange listing report and recommendation frequency stats.

use crate::models::Project;
use crate::providers::AlphaListing;
use crate::tokens::{ListingIndex, ThousandFormToken, TokenUpdate};
use regex::Regex;
use rustc_hash::FxHashMap;
use std::fmt::Write;

/// Projects shown in the pushed listing summary
pub const SUMMARY_TOP_N: usize = 100;
/// Standard tokens shown in the listing report
pub const REPORT_STANDARD_LIMIT: usize = 20;
/// Tags shown per project in prompt lines
const PROMPT_TAG_LIMIT: usize = 5;

fn rank_label(project: &Project) -> String {
    project
        .cmc_rank
        .map(|r| r.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Multi-line summary of one project for the pushed listing message
pub fn summary_line(project: &Project, index: usize, listed: bool) -> String {
    let m = project.metrics();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{}. {} ({}) - CMC rank: {}",
        index,
        project.name,
        project.symbol,
        rank_label(project)
    );
    if listed {
        let _ = writeln!(out, "   [listed on Binance spot]");
    }
    let marker = if m.percent_change_24h >= 0.0 { "▲" } else { "▼" };
    let _ = writeln!(
        out,
        "   Price: ${:.2}, 24h: {} {:.2}%",
        m.price, marker, m.percent_change_24h
    );
    let _ = writeln!(
        out,
        "   MC: ${:.2}M, FDV: ${:.2}M, MC/FDV: {:.2}",
        m.market_cap.max(0.0) / 1_000_000.0,
        m.fdv.max(0.0) / 1_000_000.0,
        m.mc_fdv_ratio()
    );
    out
}

/// Detailed project block used inside advisor prompts
pub fn detailed_line(project: &Project) -> String {
    let m = project.metrics();
    let mut out = String::new();

    let _ = writeln!(out, "{} ({}):", project.name, project.symbol);
    let _ = writeln!(
        out,
        "   - Price change [35%]: 24h {:.2}% | 7d {:.2}% | 30d {:.2}%",
        m.percent_change_24h, m.percent_change_7d, m.percent_change_30d
    );
    let _ = writeln!(
        out,
        "   - Volume [45%]: 24h ${:.2} | 7d ${:.2} | 30d ${:.2}",
        m.volume_24h, m.volume_7d, m.volume_30d
    );
    let _ = writeln!(out, "   - MC: ${:.2}", m.market_cap);
    let _ = writeln!(out, "   - VOL/MC(24h): {:.4}", m.vol_mc_ratio());
    let _ = writeln!(out, "   - FDV: ${:.2}", m.fdv);
    let _ = writeln!(out, "   - MC/FDV [10%]: {:.2}", m.mc_fdv_ratio());
    if !project.tags.is_empty() {
        let shown = &project.tags[..project.tags.len().min(PROMPT_TAG_LIMIT)];
        let more = if project.tags.len() > PROMPT_TAG_LIMIT { " ..." } else { "" };
        let _ = writeln!(out, "   - Tags [10%]: {}{}", shown.join(", "), more);
    }
    out
}

/// Pushed summary of the Alpha listing (top [`SUMMARY_TOP_N`] by market cap)
pub fn alpha_list_message(listing: &AlphaListing, index: Option<&ListingIndex>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Binance Alpha projects (updated {})",
        listing.fetched_at.format("%Y-%m-%d")
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Total projects: {}", listing.total_count);
    let _ = writeln!(out);
    let _ = writeln!(out, "Top {} Binance Alpha projects by market cap:", SUMMARY_TOP_N);
    let _ = writeln!(out);

    for (i, project) in listing.projects.iter().take(SUMMARY_TOP_N).enumerate() {
        let listed = index.is_some_and(|idx| idx.is_listed(&project.symbol));
        out.push_str(&summary_line(project, i + 1, listed));
    }
    out
}

/// Exchange listing report: first [`REPORT_STANDARD_LIMIT`] standard tokens
/// and every thousand-form token.
pub fn listing_report(standard: &[String], thousand: &[ThousandFormToken]) -> String {
    let mut out = String::from("Tokens listed on Binance spot:\n\n");

    if !standard.is_empty() {
        let mut sorted: Vec<&String> = standard.iter().collect();
        sorted.sort();
        out.push_str("Standard tokens:\n");
        for (i, token) in sorted.iter().take(REPORT_STANDARD_LIMIT).enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, token);
        }
        if sorted.len() > REPORT_STANDARD_LIMIT {
            let _ = writeln!(out, "...and {} more", sorted.len() - REPORT_STANDARD_LIMIT);
        }
        out.push('\n');
    }

    if !thousand.is_empty() {
        let mut sorted: Vec<&ThousandFormToken> = thousand.iter().collect();
        sorted.sort();
        out.push_str("1000x tokens:\n");
        for (i, t) in sorted.iter().enumerate() {
            let _ = writeln!(out, "{}. {} (real: {})", i + 1, t.full_symbol, t.real_token);
        }
        out.push('\n');
    }

    out
}

/// One-paragraph description of a token sync, for the log and console
pub fn token_update_summary(update: &TokenUpdate) -> String {
    let mut out = String::new();
    if update.symbols_changed {
        let _ = writeln!(
            out,
            "Trading pairs changed: {} existing, {} current, {} new",
            update.existing_tokens.len(),
            update.all_tokens.len(),
            update.new_tokens.len()
        );
        for token in update.new_tokens.iter().take(10) {
            let _ = writeln!(out, "- {}", token);
        }
        if update.new_tokens.len() > 10 {
            let _ = writeln!(out, "...and {} more", update.new_tokens.len() - 10);
        }
    } else {
        let _ = writeln!(
            out,
            "Trading pairs unchanged: {} tokens",
            update.all_tokens.len()
        );
    }
    let _ = writeln!(
        out,
        "Listed tokens: {} standard, {} 1000x",
        update.standard_tokens.len(),
        update.thousand_form_tokens.len()
    );
    out
}

// ============================================================
// Recommendation frequency
// ============================================================

/// `**Name (SYMBOL)**`, optionally preceded by a list ordinal
const MENTION_PATTERN: &str = r"(?:\d+\.\s+)?\*\*([^*]+?)\s*\(([A-Z0-9\-]+)\)\*\*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionCount {
    pub name: String,
    pub symbol: String,
    pub count: usize,
    pub listed: bool,
}

/// Counts project mentions across archived advice. A symbol keeps the first
/// name it was seen with.
pub struct MentionCounter {
    pattern: Regex,
    positions: FxHashMap<String, usize>,
    counts: Vec<MentionCount>,
}

/// Drop a leading `1. ` style ordinal
fn strip_ordinal(name: &str) -> &str {
    let digits = name.len() - name.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return name;
    }
    match name[digits..].strip_prefix('.') {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => name,
    }
}

impl MentionCounter {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(MENTION_PATTERN)?,
            positions: FxHashMap::default(),
            counts: Vec::new(),
        })
    }

    pub fn add_document(&mut self, text: &str) {
        for caps in self.pattern.captures_iter(text) {
            let (Some(name), Some(symbol)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let symbol = symbol.as_str().trim().to_uppercase();
            match self.positions.get(&symbol) {
                Some(&pos) => self.counts[pos].count += 1,
                None => {
                    self.positions.insert(symbol.clone(), self.counts.len());
                    self.counts.push(MentionCount {
                        name: strip_ordinal(name.as_str().trim()).to_string(),
                        symbol,
                        count: 1,
                        listed: false,
                    });
                }
            }
        }
    }

    /// Most mentioned first, ties in first-seen order. `listed` is set from
    /// `index` when one is available.
    pub fn finish(mut self, index: Option<&ListingIndex>) -> Vec<MentionCount> {
        if let Some(index) = index {
            for mention in &mut self.counts {
                mention.listed = index.is_listed(&mention.symbol);
            }
        }
        self.counts.sort_by(|a, b| b.count.cmp(&a.count));
        self.counts
    }
}

/// Markdown table of [`MentionCounter::finish`] output
pub fn frequency_report(counts: &[MentionCount], date: &str) -> String {
    let mut out = format!("# Alpha recommendation frequency ({})\n\n", date);
    out.push_str("| Project | Mentions | Status |\n");
    out.push_str("| --- | --- | --- |\n");
    for mention in counts {
        let status = if mention.listed { "🔔 listed" } else { "" };
        let _ = writeln!(
            out,
            "| {} ({}) | {} | {} |",
            mention.name, mention.symbol, mention.count, status
        );
    }
    out
}
