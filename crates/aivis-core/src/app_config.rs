use std::path::PathBuf;

/// How failed calls enter percentage and gap computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Failed calls are left out of denominators and a provider without any
    /// answer is reported as unavailable.
    #[default]
    Exclude,
    /// Failed calls count as "brand not mentioned"; denominators are the full
    /// prompt count.
    CountAsAbsent,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Exclude => write!(f, "exclude"),
            FailurePolicy::CountAsAbsent => write!(f, "count-as-absent"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub slack_webhook_url: Option<String>,
    pub log_level: String,
    pub catalog_path: PathBuf,
    pub request_timeout_secs: u64,
    pub run_timeout_secs: u64,
    pub max_concurrent_per_provider: usize,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub max_tokens: u32,
    pub openai_model: String,
    pub anthropic_model: String,
    pub gemini_model: String,
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub gemini_base_url: String,
    pub failure_policy: FailurePolicy,
    pub notify_timeout_secs: u64,
    pub report_output_path: Option<PathBuf>,
    pub user_agent: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "anthropic_api_key",
                &self.anthropic_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "slack_webhook_url",
                &self.slack_webhook_url.as_ref().map(|_| "[redacted]"),
            )
            .field("log_level", &self.log_level)
            .field("catalog_path", &self.catalog_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("run_timeout_secs", &self.run_timeout_secs)
            .field(
                "max_concurrent_per_provider",
                &self.max_concurrent_per_provider,
            )
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("max_tokens", &self.max_tokens)
            .field("openai_model", &self.openai_model)
            .field("anthropic_model", &self.anthropic_model)
            .field("gemini_model", &self.gemini_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("anthropic_base_url", &self.anthropic_base_url)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("failure_policy", &self.failure_policy)
            .field("notify_timeout_secs", &self.notify_timeout_secs)
            .field("report_output_path", &self.report_output_path)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
