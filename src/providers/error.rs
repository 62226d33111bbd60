use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Empty response from {0}")]
    Empty(&'static str),

    #[error("Cache IO error: {0}")]
    Io(#[from] std::io::Error),
}
