//! Signed markdown notifications to the DingTalk chat bot

use std::fmt::Display;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Local, TimeZone, Utc};
use hmac::{Hmac, Mac};
use reqwest::{header, Client, StatusCode};
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::DingtalkSettings;

type HmacSha256 = Hmac<Sha256>;

const MESSAGE_TITLE: &str = "文件上传通知";
const MESSAGE_TIME_FORMAT: &str = "%Y年%m月%d日 %H:%M:%S";

/// Result type for notification operations
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Errors that can occur while notifying the chat bot
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The request could not be sent or the response could not be read
    #[error("webhook request failed")]
    Network(#[from] reqwest::Error),

    /// The webhook answered with something other than 200
    #[error("webhook returned error: {status}, {body}")]
    Protocol {
        /// Response status
        status: StatusCode,
        /// Response body
        body: String,
    },

    /// The message could not be serialized
    #[error("failed to encode message")]
    Encoding(#[from] serde_json::Error),
}

/// Markdown message body accepted by the bot
#[derive(Debug, Serialize)]
pub struct MarkdownMessage {
    msgtype: &'static str,
    markdown: MarkdownContent,
}

#[derive(Debug, Serialize)]
struct MarkdownContent {
    title: String,
    text: String,
}

/// Computes `base64(HMAC-SHA256(secret, "{timestamp}\n{secret}"))`
#[must_use]
pub fn sign(secret: &str, timestamp_ms: i64) -> String {
    let string_to_sign = format!("{timestamp_ms}\n{secret}");
    hmac_sha256_base64(secret.as_bytes(), string_to_sign.as_bytes())
}

fn hmac_sha256_base64(key: &[u8], message: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Appends `&timestamp=..&sign=..` to the webhook URL
///
/// The webhook URL is expected to carry a query string already (`?access_token=..`);
/// the parameters are appended with `&` regardless and the signature is not percent-encoded.
#[must_use]
pub fn signed_webhook_url(webhook: &str, secret: &str, timestamp_ms: i64) -> String {
    let sign = sign(secret, timestamp_ms);
    format!("{webhook}&timestamp={timestamp_ms}&sign={sign}")
}

/// Builds the upload notification showing `url` as an image and as a link
#[must_use]
pub fn markdown_message<Tz>(url: &str, sent_at: &DateTime<Tz>) -> MarkdownMessage
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let text = format!(
        "### 树莓派图片上传通知\n**时间**: {}\n\n![图片预览]({url})\n\n[点击查看原图]({url})",
        sent_at.format(MESSAGE_TIME_FORMAT)
    );

    MarkdownMessage {
        msgtype: "markdown",
        markdown: MarkdownContent {
            title: MESSAGE_TITLE.to_string(),
            text,
        },
    }
}

/// Client for the DingTalk bot webhook
pub struct DingtalkNotifier {
    settings: DingtalkSettings,
    http_client: Client,
}

impl DingtalkNotifier {
    /// Creates a notifier using the client's default timeouts
    #[must_use]
    pub fn new(settings: DingtalkSettings) -> Self {
        Self {
            settings,
            http_client: Client::new(),
        }
    }

    /// Posts a notification for `url`, signed with the current time
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Encoding` if the message cannot be serialized
    /// Returns `NotifyError::Network` if the request fails in transit
    /// Returns `NotifyError::Protocol` if the response status is not 200
    pub async fn notify(&self, url: &str) -> NotifyResult<()> {
        let timestamp_ms = Utc::now().timestamp_millis();
        let message = markdown_message(url, &Local::now());
        self.send(&message, timestamp_ms).await
    }

    /// Posts `message` signed with `timestamp_ms`
    ///
    /// # Errors
    ///
    /// See [`DingtalkNotifier::notify`]
    pub async fn send(&self, message: &MarkdownMessage, timestamp_ms: i64) -> NotifyResult<()> {
        let webhook_url =
            signed_webhook_url(&self.settings.webhook, &self.settings.secret, timestamp_ms);
        let json_body = serde_json::to_vec(message)?;

        debug!("Posting notification signed at {}", timestamp_ms);

        let response = self
            .http_client
            .post(webhook_url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(json_body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await?;
            return Err(NotifyError::Protocol { status, body });
        }

        info!("Notification delivered");
        Ok(())
    }
}
