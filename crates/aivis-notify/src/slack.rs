//! Slack incoming-webhook delivery.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::NotifyError;
use crate::Notifier;

/// Error bodies longer than this are cut before they reach logs.
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// Posts `{"text": ...}` to a Slack incoming webhook.
pub struct SlackNotifier {
    client: Client,
    webhook_url: Option<String>,
}

impl std::fmt::Debug for SlackNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackNotifier")
            .field("webhook_url", &self.webhook_url.as_ref().map(|_| "[redacted]"))
            .finish_non_exhaustive()
    }
}

impl SlackNotifier {
    /// A missing `webhook_url` is accepted here and reported by
    /// [`Notifier::deliver`], so the report is still produced.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the HTTP client cannot be built.
    pub fn new(webhook_url: Option<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.filter(|url| !url.trim().is_empty()),
        })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn deliver(&self, text: &str) -> Result<(), NotifyError> {
        let url = self.webhook_url.as_deref().ok_or(NotifyError::MissingWebhook)?;

        let response = self
            .client
            .post(url)
            .json(&WebhookPayload { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::UnexpectedStatus {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        tracing::info!(chars = text.chars().count(), "report delivered to Slack");
        Ok(())
    }
}
