//! Concrete provider clients.

mod anthropic;
mod gemini;
mod openai;

use std::sync::Arc;

use aivis_core::{AppConfig, Provider};

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

use crate::client::ProviderClient;
use crate::error::ProviderError;
use crate::retry::RetryPolicy;

/// Per-provider construction parameters, usually derived from [`AppConfig`].
#[derive(Clone)]
pub struct ClientSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("user_agent", &self.user_agent)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ClientSettings {
    /// Settings for `provider` taken from the application config.
    #[must_use]
    pub fn from_app_config(config: &AppConfig, provider: Provider) -> Self {
        let (api_key, model, base_url) = match provider {
            Provider::OpenAi => (
                &config.openai_api_key,
                &config.openai_model,
                &config.openai_base_url,
            ),
            Provider::Anthropic => (
                &config.anthropic_api_key,
                &config.anthropic_model,
                &config.anthropic_base_url,
            ),
            Provider::Gemini => (
                &config.gemini_api_key,
                &config.gemini_model,
                &config.gemini_base_url,
            ),
        };

        Self {
            api_key: api_key.clone(),
            model: model.clone(),
            base_url: base_url.clone(),
            max_tokens: config.max_tokens,
            user_agent: config.user_agent.clone(),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                backoff_base_ms: config.retry_backoff_base_ms,
            },
        }
    }
}

/// Builds one client per provider, in canonical report order.
///
/// Missing API keys do not fail construction; they surface as auth failures
/// on first use.
///
/// # Errors
///
/// Returns [`ProviderError`] if an HTTP client cannot be built or a base URL
/// is invalid.
pub fn build_clients(config: &AppConfig) -> Result<Vec<Arc<dyn ProviderClient>>, ProviderError> {
    let mut clients: Vec<Arc<dyn ProviderClient>> = Vec::with_capacity(Provider::ALL.len());
    for provider in Provider::ALL {
        let settings = ClientSettings::from_app_config(config, provider);
        if settings.api_key.is_none() {
            tracing::warn!(provider = %provider, "no API key configured; all calls will fail with an auth error");
        }
        let client: Arc<dyn ProviderClient> = match provider {
            Provider::OpenAi => Arc::new(OpenAiClient::new(settings)?),
            Provider::Anthropic => Arc::new(AnthropicClient::new(settings)?),
            Provider::Gemini => Arc::new(GeminiClient::new(settings)?),
        };
        clients.push(client);
    }
    Ok(clients)
}
