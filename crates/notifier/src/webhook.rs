//! HTTP webhook delivery.

use crate::error::NotifyError;
use crate::Notifier;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// JSON payload posted to the webhook.
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    pub recipient: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
    pub sent_at: DateTime<Utc>,
}

/// Posts notifications to an HTTP endpoint that performs the actual delivery.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    /// Create a new webhook notifier.
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    #[instrument(skip(self, body))]
    async fn notify(&self, identity: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            recipient: identity,
            subject,
            body,
            sent_at: Utc::now(),
        };

        let response = self.client.post(&self.url).json(&payload).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Webhook rejected notification");
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Notification posted to webhook");
        Ok(())
    }
}
