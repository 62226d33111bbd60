use crate::providers::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Webhook URL is not configured")]
    MissingUrl,

    #[error("Webhook client setup failed: {0}")]
    Client(#[from] FetchError),

    #[error("Webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Webhook returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Webhook rejected message: errcode {errcode}, {errmsg}")]
    Rejected { errcode: i64, errmsg: String },

    #[error("Segment {index}/{total} failed: {source}")]
    Segment {
        index: usize,
        total: usize,
        #[source]
        source: Box<NotifyError>,
    },
}
