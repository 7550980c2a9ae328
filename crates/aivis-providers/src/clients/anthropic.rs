//! Anthropic messages client ("Claude" in reports).

use std::time::Duration;

use aivis_core::Provider;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use super::ClientSettings;
use crate::client::{build_http_client, check_status, endpoint_url, read_json, ProviderClient};
use crate::error::ProviderError;
use crate::retry::RetryPolicy;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

/// `x-api-key` client for `POST /v1/messages`.
pub struct AnthropicClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl AnthropicClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built or
    /// [`ProviderError::InvalidBaseUrl`] for an unusable base URL.
    pub fn new(settings: ClientSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_http_client(&settings.user_agent)?,
            endpoint: endpoint_url(&settings.base_url, "v1/messages")?,
            api_key: settings.api_key,
            model: settings.model,
            max_tokens: settings.max_tokens,
            retry: settings.retry,
        })
    }
}

#[async_trait]
impl ProviderClient for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    async fn send(&self, prompt: &str, timeout: Duration) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential {
                provider: Provider::Anthropic,
            })?;

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .timeout(timeout)
            .send()
            .await?;
        let response = check_status(Provider::Anthropic, response)?;
        let parsed: MessagesResponse = read_json(Provider::Anthropic, response).await?;

        // Tool-use or thinking blocks can precede the answer; take the first text block.
        parsed
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| ProviderError::Malformed {
                provider: Provider::Anthropic,
                reason: "no text block in content".to_owned(),
            })
    }
}
