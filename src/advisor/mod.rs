//! LLM listing advisor

pub mod chat;
pub mod error;
pub mod prompt;

pub use chat::{ChatCompletionsAdvisor, Usage};
pub use error::AdvisorError;
pub use prompt::{build_prompt, top_by_market_cap};

use async_trait::async_trait;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct Advice {
    pub text: String,
    /// The model ran out of tokens while reasoning; `text` is a notice
    pub truncated: bool,
    pub usage: Option<Usage>,
}

#[async_trait]
pub trait Advisor: Send + Sync {
    async fn advise(&self, platform: &str, prompt: &str) -> Result<Advice, AdvisorError>;
}

/// Stand-in advice for dry runs: the prompt was written, nothing was sent
pub fn dry_run_notice(platform: &str, prompt_path: &Path) -> String {
    format!(
        "## Dry run - {} prompt generated\n\nPrompt saved to: {}\n\nNo API request was sent.",
        if platform.is_empty() { "general" } else { platform },
        prompt_path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_notice() {
        let notice = dry_run_notice("Solana", Path::new("data/prompts/p.txt"));
        assert!(notice.contains("Dry run - Solana"));
        assert!(notice.contains("data/prompts/p.txt"));
        assert!(dry_run_notice("", Path::new("x")).contains("general"));
    }
}
