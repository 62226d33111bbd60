use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("Advisor API key is not configured")]
    MissingApiKey,

    #[error("Advisor request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Advisor request timed out after {0}s")]
    Timeout(u64),

    #[error("Advisor returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Advisor response could not be parsed: {0}")]
    Malformed(String),

    #[error("Advisor response too short ({content_len} chars content, {reasoning_len} chars reasoning)")]
    EmptyResponse {
        content_len: usize,
        reasoning_len: usize,
    },

    #[error("Advisor gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<AdvisorError>,
    },
}

impl AdvisorError {
    /// Timeouts and empty answers usually mean the model needed longer
    pub fn wants_longer_backoff(&self) -> bool {
        matches!(self, AdvisorError::Timeout(_) | AdvisorError::EmptyResponse { .. })
    }
}
