//! Group-bot webhook (`msgtype` text / markdown / image payloads)

use super::{Notifier, NotifyError};
use crate::config::{ProxyConfig, WebhookConfig};
use crate::providers::http_client;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Split a long message into line-aware segments of at most `max_len`
/// characters. Lines longer than `max_len` are hard-split. When more than one
/// segment results, each is prefixed with an `[i/n]` header line.
pub fn split_message(message: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    if message.chars().count() <= max_len {
        return vec![message.to_string()];
    }

    let mut segments: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in message.split('\n') {
        let line_len = line.chars().count();
        if current_len + line_len + 1 > max_len {
            if !current.is_empty() {
                segments.push(current.trim().to_string());
                current.clear();
                current_len = 0;
            }
            if line_len > max_len {
                let chars: Vec<char> = line.chars().collect();
                segments.extend(chars.chunks(max_len).map(|c| c.iter().collect::<String>()));
            } else {
                current.push_str(line);
                current_len = line_len;
            }
        } else {
            if !current.is_empty() {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(line);
            current_len += line_len;
        }
    }
    if !current.is_empty() {
        segments.push(current.trim().to_string());
    }
    segments.retain(|s| !s.is_empty());

    let total = segments.len();
    segments
        .into_iter()
        .enumerate()
        .map(|(i, s)| format!("[{}/{}]\n{}", i + 1, total, s))
        .collect()
}

fn text_payload(msgtype: &str, content: &str) -> Value {
    let mut payload = serde_json::Map::new();
    payload.insert("msgtype".to_string(), json!(msgtype));
    payload.insert(msgtype.to_string(), json!({ "content": content }));
    Value::Object(payload)
}

fn image_payload(image: &[u8]) -> Value {
    json!({
        "msgtype": "image",
        "image": {
            "base64": STANDARD.encode(image),
            "md5": format!("{:x}", md5::compute(image)),
        }
    })
}

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    max_segment_len: usize,
    segment_delay: Duration,
}

impl WebhookNotifier {
    pub fn new(config: &WebhookConfig, proxy: &ProxyConfig) -> Result<Self, NotifyError> {
        if config.url.trim().is_empty() {
            return Err(NotifyError::MissingUrl);
        }
        Ok(Self {
            client: http_client(proxy, config.timeout_secs)?,
            url: config.url.clone(),
            max_segment_len: config.max_segment_len,
            segment_delay: Duration::from_millis(config.segment_delay_ms),
        })
    }

    /// Success means HTTP 200 and, when the body is JSON carrying an
    /// `errcode`, an errcode of 0.
    async fn post(&self, payload: &Value) -> Result<(), NotifyError> {
        let response = self.client.post(&self.url).json(payload).send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status != reqwest::StatusCode::OK {
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if let Ok(reply) = serde_json::from_str::<Value>(&body) {
            let errcode = reply.get("errcode").and_then(Value::as_i64).unwrap_or(0);
            if errcode != 0 {
                return Err(NotifyError::Rejected {
                    errcode,
                    errmsg: reply
                        .get("errmsg")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                });
            }
        }
        Ok(())
    }

    /// Send segments one at a time, stopping at the first failure
    async fn send_segmented(&self, msgtype: &str, message: &str) -> Result<(), NotifyError> {
        let segments = split_message(message, self.max_segment_len);
        let total = segments.len();
        if total > 1 {
            info!(segments = total, "Sending message in segments");
        }

        for (i, segment) in segments.iter().enumerate() {
            if let Err(e) = self.post(&text_payload(msgtype, segment)).await {
                warn!(segment = i + 1, total, error = %e, "Webhook segment failed");
                return Err(NotifyError::Segment {
                    index: i + 1,
                    total,
                    source: Box::new(e),
                });
            }
            debug!(segment = i + 1, total, chars = segment.chars().count(), "Segment sent");
            if i + 1 < total {
                tokio::time::sleep(self.segment_delay).await;
            }
        }

        info!(segments = total, "Message delivered");
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        self.send_segmented("text", text).await
    }

    async fn send_markdown(&self, text: &str) -> Result<(), NotifyError> {
        self.send_segmented("markdown", text).await
    }

    async fn send_image(&self, image: &[u8]) -> Result<(), NotifyError> {
        self.post(&image_payload(image)).await?;
        info!(bytes = image.len(), "Image delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notifier(url: String) -> WebhookNotifier {
        WebhookNotifier::new(
            &WebhookConfig {
                url,
                max_segment_len: 10,
                segment_delay_ms: 1,
                timeout_secs: 5,
            },
            &ProxyConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_split_short_message_untouched() {
        assert_eq!(split_message("hello", 10), vec!["hello"]);
    }

    #[test]
    fn test_split_is_line_aware() {
        let segments = split_message("abc\ndef\nghi", 7);
        assert_eq!(segments, vec!["[1/2]\nabc\ndef", "[2/2]\nghi"]);
    }

    #[test]
    fn test_split_hard_splits_long_lines() {
        let long = "x".repeat(25);
        let segments = split_message(&format!("head\n{}\ntail", long), 10);
        assert_eq!(
            segments,
            vec![
                "[1/5]\nhead".to_string(),
                format!("[2/5]\n{}", "x".repeat(10)),
                format!("[3/5]\n{}", "x".repeat(10)),
                format!("[4/5]\n{}", "x".repeat(5)),
                "[5/5]\ntail".to_string(),
            ]
        );
    }

    #[test]
    fn test_split_counts_chars_not_bytes() {
        let msg = "币安智能链\n索拉纳";
        assert_eq!(split_message(msg, 9), vec![msg.to_string()]);
        assert_eq!(split_message(msg, 5), vec!["[1/2]\n币安智能链", "[2/2]\n索拉纳"]);
    }

    #[test]
    fn test_image_payload_carries_md5() {
        let payload = image_payload(b"abc");
        assert_eq!(payload["image"]["base64"], "YWJj");
        assert_eq!(payload["image"]["md5"], "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_missing_url_rejected() {
        let err = WebhookNotifier::new(&WebhookConfig::default(), &ProxyConfig::default());
        assert!(matches!(err, Err(NotifyError::MissingUrl)));
    }

    #[tokio::test]
    async fn test_send_text_posts_every_segment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"msgtype": "text"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errcode": 0, "errmsg": "ok"})))
            .expect(2)
            .mount(&server)
            .await;

        notifier(server.uri()).send_text("abc\ndef\nghi").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_aborts_on_first_failed_segment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errcode": 93000, "errmsg": "invalid"})))
            .expect(1)
            .mount(&server)
            .await;

        let err = notifier(server.uri())
            .send_markdown("abc\ndef\nghi")
            .await
            .unwrap_err();
        match err {
            NotifyError::Segment { index, total, source } => {
                assert_eq!((index, total), (1, 2));
                assert!(matches!(*source, NotifyError::Rejected { errcode: 93000, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_send_image_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"msgtype": "image"})))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = notifier(server.uri()).send_image(b"png").await.unwrap_err();
        assert!(matches!(err, NotifyError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_send_image_is_not_segmented() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "msgtype": "image",
                "image": {"md5": format!("{:x}", md5::compute(vec![7u8; 64]))}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errcode": 0, "errmsg": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        // Larger than max_segment_len, still a single post
        notifier(server.uri()).send_image(&[7u8; 64]).await.unwrap();
    }
}
