use aivis_core::{ErrorKind, Provider};
use thiserror::Error;

/// Errors returned by a single provider request.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API key was configured for the provider.
    #[error("no API key configured for {provider}")]
    MissingCredential { provider: Provider },

    /// HTTP 401/403, or a provider-specific "invalid key" response.
    #[error("{provider} rejected the API key (HTTP {status})")]
    Unauthorized { provider: Provider, status: u16 },

    #[error("rate limited by {provider} (retry after {retry_after_secs:?}s)")]
    RateLimited {
        provider: Provider,
        retry_after_secs: Option<u64>,
    },

    /// Network, TLS or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {provider}")]
    UnexpectedStatus { provider: Provider, status: u16 },

    /// The body could not be read as a text answer.
    #[error("malformed {provider} response: {reason}")]
    Malformed { provider: Provider, reason: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ProviderError {
    /// Classify the error into the per-call taxonomy recorded on outcomes.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::MissingCredential { .. } | ProviderError::Unauthorized { .. } => {
                ErrorKind::AuthError
            }
            ProviderError::RateLimited { .. } => ErrorKind::RateLimited,
            ProviderError::Http(e) if e.is_timeout() => ErrorKind::Timeout,
            ProviderError::Http(e) if e.is_decode() => ErrorKind::MalformedResponse,
            ProviderError::Http(_) | ProviderError::InvalidBaseUrl { .. } => ErrorKind::NetworkError,
            ProviderError::UnexpectedStatus { status, .. } if *status >= 500 => {
                ErrorKind::NetworkError
            }
            ProviderError::UnexpectedStatus { .. } | ProviderError::Malformed { .. } => {
                ErrorKind::MalformedResponse
            }
        }
    }
}
