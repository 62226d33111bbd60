//! Message delivery
//!
//! [`WebhookNotifier`] posts to a group-bot webhook; [`LogNotifier`] only
//! writes to the log and is used when no webhook is configured.
//!
//! The pipeline only sends text. `send_image` is transport for pre-rendered
//! images (PNG/JPEG bytes) supplied by callers; nothing here renders one.

pub mod error;
pub mod webhook;

pub use error::NotifyError;
pub use webhook::{WebhookNotifier, split_message};

use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<(), NotifyError>;
    async fn send_markdown(&self, text: &str) -> Result<(), NotifyError>;
    /// Deliver an already encoded image as-is
    async fn send_image(&self, image: &[u8]) -> Result<(), NotifyError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        info!(chars = text.chars().count(), "[notify:text]\n{}", text);
        Ok(())
    }

    async fn send_markdown(&self, text: &str) -> Result<(), NotifyError> {
        info!(chars = text.chars().count(), "[notify:markdown]\n{}", text);
        Ok(())
    }

    async fn send_image(&self, image: &[u8]) -> Result<(), NotifyError> {
        info!(bytes = image.len(), "[notify:image]");
        Ok(())
    }
}
