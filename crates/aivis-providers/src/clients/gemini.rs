//! Google Gemini `generateContent` client.

use std::time::Duration;

use aivis_core::Provider;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use super::ClientSettings;
use crate::client::{build_http_client, check_status, endpoint_url, read_json, ProviderClient};
use crate::error::ProviderError;
use crate::retry::RetryPolicy;

/// Gemini reports a bad key as HTTP 400 with this reason instead of 401.
const INVALID_KEY_MARKER: &str = "API_KEY_INVALID";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Client for `POST /v1beta/models/{model}:generateContent`.
///
/// The key travels in the `x-goog-api-key` header rather than the query
/// string so it never shows up in request URLs or error messages.
pub struct GeminiClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl GeminiClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built or
    /// [`ProviderError::InvalidBaseUrl`] for an unusable base URL.
    pub fn new(settings: ClientSettings) -> Result<Self, ProviderError> {
        let path = format!("v1beta/models/{}:generateContent", settings.model);
        Ok(Self {
            client: build_http_client(&settings.user_agent)?,
            endpoint: endpoint_url(&settings.base_url, &path)?,
            api_key: settings.api_key,
            max_tokens: settings.max_tokens,
            retry: settings.retry,
        })
    }
}

#[async_trait]
impl ProviderClient for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    async fn send(&self, prompt: &str, timeout: Duration) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential {
                provider: Provider::Gemini,
            })?;

        let request = GenerateRequest {
            contents: [Content {
                parts: [RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.max_tokens,
            },
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .timeout(timeout)
            .send()
            .await?;

        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await?;
            if body.contains(INVALID_KEY_MARKER) {
                return Err(ProviderError::Unauthorized {
                    provider: Provider::Gemini,
                    status: StatusCode::BAD_REQUEST.as_u16(),
                });
            }
            return Err(ProviderError::UnexpectedStatus {
                provider: Provider::Gemini,
                status: StatusCode::BAD_REQUEST.as_u16(),
            });
        }

        let response = check_status(Provider::Gemini, response)?;
        let parsed: GenerateResponse = read_json(Provider::Gemini, response).await?;

        // Safety-blocked prompts come back with no candidates or no parts.
        let parts: Vec<String> = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if parts.is_empty() {
            return Err(ProviderError::Malformed {
                provider: Provider::Gemini,
                reason: "no text parts in candidates[0]".to_owned(),
            });
        }

        Ok(parts.concat())
    }
}
