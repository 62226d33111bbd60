//! OpenAI-compatible chat-completions advisor (DeepSeek by default)

use super::error::AdvisorError;
use super::{Advice, Advisor};
use crate::config::AdvisorConfig;
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Answers at or below this length are treated as empty
pub const MIN_ADVICE_CHARS: usize = 100;
const REASONING_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessageOut<'a>>,
    temperature: f64,
    max_tokens: u32,
    top_p: f64,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessageOut<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: ChatMessageIn,
}

#[derive(Debug, Default, Deserialize)]
struct ChatMessageIn {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

fn preview(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Pick the usable answer out of a completion. Reasoning models may spend the
/// whole token budget on `reasoning_content`; that case yields a truncation
/// notice instead of the answer.
fn select_answer(content: &str, reasoning: &str) -> Result<(String, bool), AdvisorError> {
    let (text, truncated) = if content.trim().is_empty() && !reasoning.trim().is_empty() {
        let notice = format!(
            "Response truncated\n\n\
             Reasoning length: {} chars\n\
             Answer length: {} chars\n\n\
             Increase max_tokens to get a complete answer.\n\n\
             Reasoning preview:\n{}...",
            reasoning.chars().count(),
            content.chars().count(),
            preview(reasoning, REASONING_PREVIEW_CHARS)
        );
        (notice, true)
    } else {
        (content.to_string(), false)
    };

    if text.chars().count() <= MIN_ADVICE_CHARS {
        return Err(AdvisorError::EmptyResponse {
            content_len: content.chars().count(),
            reasoning_len: reasoning.chars().count(),
        });
    }
    Ok((text, truncated))
}

pub struct ChatCompletionsAdvisor {
    client: reqwest::Client,
    config: AdvisorConfig,
}

impl ChatCompletionsAdvisor {
    pub fn new(config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        if config.api_key.trim().is_empty() {
            warn!("Advisor API key is not set");
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("alpha_scout/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn attempt_timeout(&self, attempt: u32) -> u64 {
        self.config.timeout_secs + u64::from(attempt) * self.config.timeout_step_secs
    }

    /// Delay before the next attempt: doubled after timeouts and empty
    /// answers, otherwise jittered by up to 50%.
    fn retry_delay(&self, last: &AdvisorError) -> Duration {
        let base = self.config.retry_delay_ms as f64;
        let ms = if last.wants_longer_backoff() {
            base * 2.0
        } else {
            base * (1.0 + rand::thread_rng().gen_range(0.0..0.5))
        };
        Duration::from_millis(ms as u64)
    }

    async fn attempt(&self, prompt: &str, timeout_secs: u64) -> Result<Advice, AdvisorError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessageOut {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            top_p: self.config.top_p,
            stream: false,
        };

        let started = Instant::now();
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .timeout(Duration::from_secs(timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AdvisorError::Timeout(timeout_secs)
                } else {
                    AdvisorError::Request(e)
                }
            })?;

        let status = response.status();
        info!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Advisor responded"
        );
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::Status {
                status: status.as_u16(),
                body: preview(&body, 500).to_string(),
            });
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AdvisorError::Timeout(timeout_secs)
            } else {
                AdvisorError::Malformed(e.to_string())
            }
        })?;

        if let Some(usage) = &body.usage {
            info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Advisor token usage"
            );
        }

        let message = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .unwrap_or_default();
        let content = message.content.unwrap_or_default();
        let reasoning = message.reasoning_content.unwrap_or_default();
        if !reasoning.is_empty() {
            debug!(reasoning_len = reasoning.len(), "Reasoning content present");
        }

        let (text, truncated) = select_answer(&content, &reasoning)?;
        if truncated {
            warn!("Answer empty but reasoning present; returning truncation notice");
        }
        Ok(Advice {
            text,
            truncated,
            usage: body.usage,
        })
    }
}

#[async_trait]
impl Advisor for ChatCompletionsAdvisor {
    async fn advise(&self, platform: &str, prompt: &str) -> Result<Advice, AdvisorError> {
        if self.config.api_key.trim().is_empty() {
            return Err(AdvisorError::MissingApiKey);
        }

        let attempts = self.config.max_retries.max(1);
        let mut last: Option<AdvisorError> = None;

        for attempt in 0..attempts {
            let timeout = self.attempt_timeout(attempt);
            info!(platform, attempt = attempt + 1, attempts, timeout_secs = timeout, "Requesting advice");

            match self.attempt(prompt, timeout).await {
                Ok(advice) => {
                    info!(platform, chars = advice.text.chars().count(), "Advice received");
                    return Ok(advice);
                }
                Err(e) => {
                    warn!(platform, attempt = attempt + 1, error = %e, "Advice attempt failed");
                    if attempt + 1 < attempts {
                        let delay = self.retry_delay(&e);
                        info!(delay_ms = delay.as_millis() as u64, "Retrying advice request");
                        tokio::time::sleep(delay).await;
                    }
                    last = Some(e);
                }
            }
        }

        error!(platform, attempts, "Giving up on advice");
        Err(AdvisorError::Exhausted {
            attempts,
            last: Box::new(last.unwrap_or(AdvisorError::EmptyResponse {
                content_len: 0,
                reasoning_len: 0,
            })),
        })
    }
}
