//! Delivery of rendered reports to a team messaging channel.

pub mod error;
pub mod slack;

use async_trait::async_trait;

pub use error::NotifyError;
pub use slack::SlackNotifier;

/// Destination for a finished report.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` once. Callers keep the text, so a failure never loses it.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when the message was not accepted.
    async fn deliver(&self, text: &str) -> Result<(), NotifyError>;
}
