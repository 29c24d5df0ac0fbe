//! Outbound webhooks: the urgent alert sink and the escalation sink.
//!
//! Both are best-effort. Callers log a [`NotifyError`] and carry on; a
//! notification failure never aborts a run.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Timeout for webhook POSTs.
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("webhook returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// A sink that accepts JSON payloads.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, payload: &Value) -> Result<(), NotifyError>;

    /// Destination, for logs.
    fn target(&self) -> &str;
}

/// POSTs payloads to a fixed webhook URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, payload: &Value) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(&self.url)
            .timeout(WEBHOOK_TIMEOUT)
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    fn target(&self) -> &str {
        &self.url
    }
}
