//! Outbound webhook delivery
//!
//! Fire-and-forget sink for formatted notification text. Delivery is
//! best-effort; failures are returned for the caller to log and move on.

use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Request(String),
    #[error("webhook returned status {0}")]
    Status(u16),
}

pub struct WebhookSink {
    client: Client,
}

impl WebhookSink {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Deliver one text payload to a webhook URL.
    pub async fn send(&self, url: &str, text: &str) -> Result<(), NotifyError> {
        info!("sending webhook notification");
        let response = self
            .client
            .post(url)
            .json(&json!({ "content": text }))
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

impl Default for WebhookSink {
    fn default() -> Self {
        Self::new()
    }
}
