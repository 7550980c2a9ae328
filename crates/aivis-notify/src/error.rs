use thiserror::Error;

/// Errors returned when delivering a rendered report.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("no webhook URL configured (set SLACK_WEBHOOK_URL)")]
    MissingWebhook,

    /// Connection, TLS or timeout failure talking to the webhook.
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}
