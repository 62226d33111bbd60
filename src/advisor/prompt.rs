//! Listing-candidate prompt
//!
//! The prompt states the four listing factors with their weights, the
//! expected output layout, and the top projects of one platform by USD
//! market cap.

use crate::models::Project;
use crate::report::detailed_line;
use std::cmp::Ordering;
use std::fmt::Write;

fn usd_market_cap(project: &Project) -> f64 {
    project.usd_quote().map(|q| q.market_cap).unwrap_or(0.0)
}

/// Projects sorted by USD market cap, highest first, truncated to `top_n`.
/// Ties keep input order.
pub fn top_by_market_cap<'a>(projects: &[&'a Project], top_n: usize) -> Vec<&'a Project> {
    let mut sorted: Vec<&Project> = projects.to_vec();
    sorted.sort_by(|a, b| {
        usd_market_cap(b)
            .partial_cmp(&usd_market_cap(a))
            .unwrap_or(Ordering::Equal)
    });
    sorted.truncate(top_n);
    sorted
}

fn scope(platform: &str) -> String {
    if platform.is_empty() {
        String::new()
    } else {
        format!(" on {}", platform)
    }
}

pub fn build_prompt(platform: &str, date: &str, projects: &[&Project], top_n: usize) -> String {
    let scope = scope(platform);
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "As a crypto analyst, assess which of the following circulating Binance Alpha projects{} are most likely to qualify for a Binance spot listing.",
        scope
    );
    prompt.push('\n');

    prompt.push_str(
        "Binance states that circulating Alpha projects are considered for spot listing mainly on four factors:\n\
         \n\
         1. Trading volume: high and sustained volume on the Alpha platform\n\
         2. Price stability: no major crashes or artificial pumps while trading\n\
         3. Regulatory compliance: all compliance requirements are met\n\
         4. Token distribution and unlocks: a reasonable distribution and unlock schedule\n\
         \n",
    );

    prompt.push_str(
        "Evaluation points and weights:\n\
         \n\
         1. Trading volume (core, weight 45%):\n\
         \x20  - 24h volume: high, stable and proportionate to market cap\n\
         \x20  - 7d and 30d volume trend: stable or rising without large swings\n\
         \x20  - VOL/MC ratio: healthy 24h volume relative to market cap\n\
         2. Price stability (weight 35%):\n\
         \x20  - 24h, 7d and 30d price change: no crash or pump behaviour\n\
         3. Regulatory compliance (threshold, weight 10%):\n\
         \x20  - No regulatory risk, clean team background, transparent operation\n\
         4. Token distribution and unlocks (threshold, weight 10%):\n\
         \x20  - MC/FDV ratio: higher means less unlock pressure\n\
         \x20  - Holder concentration, upcoming unlocks, token economics\n\
         \n",
    );

    let _ = writeln!(
        prompt,
        "Weigh all four factors for every Binance Alpha project{} and answer in this order:",
        scope
    );
    prompt.push_str(
        "\n\
         Part 1: Summary (TOP 3 projects)\n\
         1. Overview table: | Name | Symbol | 24h volume | MC | FDV | MC/FDV | Score (1-10) |\n\
         2. Key strengths: one or two per project\n\
         3. Main risks: one or two per project\n\
         \n\
         Part 2: Detailed analysis (TOP 3 projects)\n\
         1. Table: | Name | Symbol | 24h volume | MC | FDV | MC/FDV | Volume (45%) | Stability (35%) | Compliance (10%) | Distribution (10%) | Total |\n\
         2. Weighted analysis of each factor\n\
         3. Final weighted score with the calculation shown\n\
         \n\
         Keep the analysis data-driven and show how the weights affect the result.\n\
         \n",
    );

    let _ = writeln!(
        prompt,
        "Current circulating Binance Alpha projects{} ({}, by market cap):",
        scope, date
    );
    for (i, project) in top_by_market_cap(projects, top_n).iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", i + 1, detailed_line(project));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Quote;

    fn project(symbol: &str, market_cap: f64) -> Project {
        Project {
            name: symbol.to_string(),
            symbol: symbol.to_string(),
            quotes: vec![Quote {
                name: "USD".to_string(),
                market_cap,
                ..Quote::default()
            }],
            ..Project::default()
        }
    }

    #[test]
    fn test_top_by_market_cap() {
        let projects = [project("A", 1.0), project("B", 3.0), project("C", 2.0), project("D", 3.0)];
        let refs: Vec<&Project> = projects.iter().collect();

        let top = top_by_market_cap(&refs, 3);
        let symbols: Vec<&str> = top.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["B", "D", "C"]);
    }

    #[test]
    fn test_prompt_contains_weights_and_projects() {
        let projects: Vec<Project> = (0..20).map(|i| project(&format!("P{}", i), i as f64)).collect();
        let refs: Vec<&Project> = projects.iter().collect();

        let prompt = build_prompt("Solana", "2025-03-01", &refs, 15);

        assert!(prompt.contains("Binance Alpha projects on Solana"));
        assert!(prompt.contains("weight 45%"));
        assert!(prompt.contains("weight 35%"));
        assert!(prompt.contains("(2025-03-01, by market cap)"));
        assert!(prompt.contains("1. P19 (P19):"));
        assert!(prompt.contains("15. P5 (P5):"));
        assert!(!prompt.contains("P4 (P4)"));
    }

    #[test]
    fn test_prompt_without_platform() {
        let prompt = build_prompt("", "2025-03-01", &[], 15);
        assert!(prompt.contains("circulating Binance Alpha projects are most likely"));
    }
}
