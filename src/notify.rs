//! Best-effort delivery of alert and recovery text.
//!
//! Failures are returned to the caller only so they can be logged. The
//! collector never retries within a cycle; a condition that persists is
//! re-evaluated on the next scheduled run.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::NotifyFailure;

// ---

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), NotifyFailure>;
}

pub type NotifierPtr = Arc<dyn Notifier>;

/// Posts `{"text": message}` to a webhook URL. Any 2xx counts as delivered.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        // ---
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyFailure> {
        // ---
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { text: message })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyFailure::Rejected(status.as_u16()));
        }

        tracing::debug!("Notification delivered ({})", status);
        Ok(())
    }
}
