//! Core records passed between the executor, the aggregator and the formatter.

use serde::{Deserialize, Serialize};

/// One catalog question. `id` is the catalog index and fixes report ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: usize,
    pub category: String,
    pub text: String,
}

/// The closed set of conversational AI services queried each run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Gemini,
}

impl Provider {
    /// Canonical report order.
    pub const ALL: [Provider; 3] = [Provider::OpenAi, Provider::Anthropic, Provider::Gemini];

    /// Stable machine identifier used in logs.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Provider::OpenAi => "chatgpt",
            Provider::Anthropic => "claude",
            Provider::Gemini => "gemini",
        }
    }

    /// Product name shown in the report.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Provider::OpenAi => "ChatGPT",
            Provider::Anthropic => "Claude",
            Provider::Gemini => "Gemini",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// Why a single (prompt, provider) call produced no answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or rejected credential. Fatal for the provider for the whole run.
    AuthError,
    RateLimited,
    NetworkError,
    /// The provider answered with something that is not a text answer.
    MalformedResponse,
    Timeout,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ErrorKind::AuthError => "auth error",
            ErrorKind::RateLimited => "rate limited",
            ErrorKind::NetworkError => "network error",
            ErrorKind::MalformedResponse => "malformed response",
            ErrorKind::Timeout => "timeout",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryStatus {
    Success { response_text: String },
    Failure { error_kind: ErrorKind },
}

/// Result of one (prompt, provider) call. Exactly one exists per pair after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub prompt_id: usize,
    pub provider: Provider,
    #[serde(flatten)]
    pub status: QueryStatus,
}

impl QueryOutcome {
    #[must_use]
    pub fn success(prompt_id: usize, provider: Provider, response_text: impl Into<String>) -> Self {
        Self {
            prompt_id,
            provider,
            status: QueryStatus::Success {
                response_text: response_text.into(),
            },
        }
    }

    #[must_use]
    pub fn failure(prompt_id: usize, provider: Provider, error_kind: ErrorKind) -> Self {
        Self {
            prompt_id,
            provider,
            status: QueryStatus::Failure { error_kind },
        }
    }

    /// The answer text, or `None` for a failed call.
    #[must_use]
    pub fn response_text(&self) -> Option<&str> {
        match &self.status {
            QueryStatus::Success { response_text } => Some(response_text),
            QueryStatus::Failure { .. } => None,
        }
    }

    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self.status {
            QueryStatus::Success { .. } => None,
            QueryStatus::Failure { error_kind } => Some(error_kind),
        }
    }
}
