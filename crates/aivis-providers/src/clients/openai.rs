//! OpenAI chat completions client ("ChatGPT" in reports).

use std::time::Duration;

use aivis_core::Provider;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use super::ClientSettings;
use crate::client::{build_http_client, check_status, endpoint_url, read_json, ProviderClient};
use crate::error::ProviderError;
use crate::retry::RetryPolicy;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Bearer-token client for `POST /v1/chat/completions`.
pub struct OpenAiClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl OpenAiClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built or
    /// [`ProviderError::InvalidBaseUrl`] for an unusable base URL.
    pub fn new(settings: ClientSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_http_client(&settings.user_agent)?,
            endpoint: endpoint_url(&settings.base_url, "v1/chat/completions")?,
            api_key: settings.api_key,
            model: settings.model,
            max_tokens: settings.max_tokens,
            retry: settings.retry,
        })
    }
}

#[async_trait]
impl ProviderClient for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    async fn send(&self, prompt: &str, timeout: Duration) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential {
                provider: Provider::OpenAi,
            })?;

        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(&request)
            .timeout(timeout)
            .send()
            .await?;
        let response = check_status(Provider::OpenAi, response)?;
        let parsed: ChatResponse = read_json(Provider::OpenAi, response).await?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::Malformed {
                provider: Provider::OpenAi,
                reason: "no message content in choices[0]".to_owned(),
            })
    }
}
