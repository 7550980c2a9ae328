//! The provider abstraction shared by every conversational AI service.

use std::time::Duration;

use aivis_core::{Prompt, Provider, QueryOutcome};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};

use crate::error::ProviderError;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// One conversational AI service.
///
/// Implementations only describe a single request ([`ProviderClient::send`]);
/// retries and failure classification live in the provided
/// [`ProviderClient::query`], so every provider gets the same policy.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn provider(&self) -> Provider;

    fn retry_policy(&self) -> &RetryPolicy;

    /// Issue one request and return the answer text.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] describing why no answer was obtained.
    async fn send(&self, prompt: &str, timeout: Duration) -> Result<String, ProviderError>;

    /// Ask `prompt` with retries. Never fails: errors become a
    /// `Failure` outcome carrying the last error kind.
    async fn query(&self, prompt: &Prompt, timeout: Duration) -> QueryOutcome {
        let provider = self.provider();
        let result =
            retry_with_backoff(self.retry_policy(), provider, || self.send(&prompt.text, timeout))
                .await;

        match result {
            Ok(text) => QueryOutcome::success(prompt.id, provider, text),
            Err(err) => {
                let kind = err.kind();
                tracing::warn!(
                    provider = %provider,
                    prompt_id = prompt.id,
                    error_kind = %kind,
                    error = %err,
                    "provider query failed"
                );
                QueryOutcome::failure(prompt.id, provider, kind)
            }
        }
    }
}

/// Builds the shared `reqwest` client. Per-request timeouts are applied on
/// each request so the executor can pass its own budget.
pub(crate) fn build_http_client(user_agent: &str) -> Result<Client, ProviderError> {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Joins `path` onto `base_url`, tolerating a trailing slash on the base.
pub(crate) fn endpoint_url(base_url: &str, path: &str) -> Result<Url, ProviderError> {
    let joined = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| ProviderError::InvalidBaseUrl {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })
}

/// Maps auth, rate-limit and other non-2xx statuses to typed errors.
pub(crate) fn check_status(provider: Provider, response: Response) -> Result<Response, ProviderError> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ProviderError::Unauthorized {
            provider,
            status: status.as_u16(),
        });
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());
        return Err(ProviderError::RateLimited {
            provider,
            retry_after_secs,
        });
    }

    if !status.is_success() {
        return Err(ProviderError::UnexpectedStatus {
            provider,
            status: status.as_u16(),
        });
    }

    Ok(response)
}

/// Reads the body and deserializes it into the provider's response shape.
pub(crate) async fn read_json<T>(provider: Provider, response: Response) -> Result<T, ProviderError>
where
    T: serde::de::DeserializeOwned,
{
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ProviderError::Malformed {
        provider,
        reason: e.to_string(),
    })
}
