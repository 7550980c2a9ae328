use crate::app_config::{AppConfig, FailurePolicy};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Credentials and the webhook URL are optional here: a missing key surfaces
/// as an auth failure on first use, a missing webhook as a delivery failure.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let openai_api_key = optional("OPENAI_API_KEY");
    let anthropic_api_key = optional("ANTHROPIC_API_KEY");
    let gemini_api_key = optional("GEMINI_API_KEY");
    let slack_webhook_url = optional("SLACK_WEBHOOK_URL");

    let log_level = or_default("AIVIS_LOG_LEVEL", "info");
    let catalog_path = PathBuf::from(or_default("AIVIS_CATALOG_PATH", "./config/catalog.yaml"));

    let request_timeout_secs = parse_u64("AIVIS_REQUEST_TIMEOUT_SECS", "30")?;
    let run_timeout_secs = parse_u64("AIVIS_RUN_TIMEOUT_SECS", "240")?;
    if run_timeout_secs <= request_timeout_secs {
        return Err(invalid(
            "AIVIS_RUN_TIMEOUT_SECS",
            format!(
                "run timeout ({run_timeout_secs}s) must be greater than the request timeout ({request_timeout_secs}s)"
            ),
        ));
    }

    let max_concurrent_per_provider = parse_usize("AIVIS_MAX_CONCURRENT_PER_PROVIDER", "4")?;
    if max_concurrent_per_provider == 0 {
        return Err(invalid(
            "AIVIS_MAX_CONCURRENT_PER_PROVIDER",
            "must be at least 1".to_string(),
        ));
    }

    let max_retries = parse_u32("AIVIS_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("AIVIS_RETRY_BACKOFF_BASE_MS", "1000")?;
    let max_tokens = parse_u32("AIVIS_MAX_TOKENS", "800")?;

    let openai_model = or_default("AIVIS_OPENAI_MODEL", "gpt-4o-mini");
    let anthropic_model = or_default("AIVIS_ANTHROPIC_MODEL", "claude-haiku-4-5-20251001");
    let gemini_model = or_default("AIVIS_GEMINI_MODEL", "gemini-2.0-flash");

    let openai_base_url = or_default("AIVIS_OPENAI_BASE_URL", "https://api.openai.com");
    let anthropic_base_url = or_default("AIVIS_ANTHROPIC_BASE_URL", "https://api.anthropic.com");
    let gemini_base_url = or_default(
        "AIVIS_GEMINI_BASE_URL",
        "https://generativelanguage.googleapis.com",
    );

    let failure_policy = parse_failure_policy(&or_default("AIVIS_FAILURE_POLICY", "exclude"))?;
    let notify_timeout_secs = parse_u64("AIVIS_NOTIFY_TIMEOUT_SECS", "15")?;
    let report_output_path = optional("AIVIS_REPORT_OUTPUT_PATH").map(PathBuf::from);
    let user_agent = or_default("AIVIS_USER_AGENT", "aivis/0.1 (ai-visibility-tracker)");

    Ok(AppConfig {
        openai_api_key,
        anthropic_api_key,
        gemini_api_key,
        slack_webhook_url,
        log_level,
        catalog_path,
        request_timeout_secs,
        run_timeout_secs,
        max_concurrent_per_provider,
        max_retries,
        retry_backoff_base_ms,
        max_tokens,
        openai_model,
        anthropic_model,
        gemini_model,
        openai_base_url,
        anthropic_base_url,
        gemini_base_url,
        failure_policy,
        notify_timeout_secs,
        report_output_path,
        user_agent,
    })
}

/// Parse `AIVIS_FAILURE_POLICY`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than `exclude`
/// or `count-as-absent`.
fn parse_failure_policy(s: &str) -> Result<FailurePolicy, ConfigError> {
    match s.to_ascii_lowercase().as_str() {
        "exclude" => Ok(FailurePolicy::Exclude),
        "count-as-absent" | "count_as_absent" => Ok(FailurePolicy::CountAsAbsent),
        other => Err(ConfigError::InvalidEnvVar {
            var: "AIVIS_FAILURE_POLICY".to_string(),
            reason: format!("unknown policy '{other}'; expected 'exclude' or 'count-as-absent'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn build_app_config_succeeds_with_empty_env() {
        let map: HashMap<&str, &str> = HashMap::new();
        let result = build_app_config(lookup_from_map(&map));
        assert!(result.is_ok(), "expected Ok, got: {result:?}");
        let cfg = result.unwrap();
        assert!(cfg.openai_api_key.is_none());
        assert!(cfg.anthropic_api_key.is_none());
        assert!(cfg.gemini_api_key.is_none());
        assert!(cfg.slack_webhook_url.is_none());
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.catalog_path.to_string_lossy(), "./config/catalog.yaml");
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.run_timeout_secs, 240);
        assert_eq!(cfg.max_concurrent_per_provider, 4);
        assert_eq!(cfg.max_retries, 2);
        assert_eq!(cfg.retry_backoff_base_ms, 1000);
        assert_eq!(cfg.max_tokens, 800);
        assert_eq!(cfg.openai_model, "gpt-4o-mini");
        assert_eq!(cfg.anthropic_model, "claude-haiku-4-5-20251001");
        assert_eq!(cfg.gemini_model, "gemini-2.0-flash");
        assert_eq!(cfg.failure_policy, FailurePolicy::Exclude);
        assert_eq!(cfg.notify_timeout_secs, 15);
        assert!(cfg.report_output_path.is_none());
    }

    #[test]
    fn credentials_are_read_when_present() {
        let mut map = HashMap::new();
        map.insert("OPENAI_API_KEY", "sk-test");
        map.insert("SLACK_WEBHOOK_URL", "https://hooks.slack.com/services/x");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(
            cfg.slack_webhook_url.as_deref(),
            Some("https://hooks.slack.com/services/x")
        );
    }

    #[test]
    fn blank_credentials_are_treated_as_missing() {
        let mut map = HashMap::new();
        map.insert("GEMINI_API_KEY", "   ");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.gemini_api_key.is_none());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut map = HashMap::new();
        map.insert("ANTHROPIC_API_KEY", "sk-ant-secret");
        map.insert("SLACK_WEBHOOK_URL", "https://hooks.slack.com/services/secret");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("sk-ant-secret"));
        assert!(!debug.contains("services/secret"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn request_timeout_override() {
        let mut map = HashMap::new();
        map.insert("AIVIS_REQUEST_TIMEOUT_SECS", "20");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.request_timeout_secs, 20);
    }

    #[test]
    fn request_timeout_invalid() {
        let mut map = HashMap::new();
        map.insert("AIVIS_REQUEST_TIMEOUT_SECS", "not-a-number");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "AIVIS_REQUEST_TIMEOUT_SECS"),
            "expected InvalidEnvVar(AIVIS_REQUEST_TIMEOUT_SECS), got: {result:?}"
        );
    }

    #[test]
    fn run_timeout_must_exceed_request_timeout() {
        let mut map = HashMap::new();
        map.insert("AIVIS_REQUEST_TIMEOUT_SECS", "60");
        map.insert("AIVIS_RUN_TIMEOUT_SECS", "60");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "AIVIS_RUN_TIMEOUT_SECS"),
            "expected InvalidEnvVar(AIVIS_RUN_TIMEOUT_SECS), got: {result:?}"
        );
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut map = HashMap::new();
        map.insert("AIVIS_MAX_CONCURRENT_PER_PROVIDER", "0");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "AIVIS_MAX_CONCURRENT_PER_PROVIDER"),
            "expected InvalidEnvVar(AIVIS_MAX_CONCURRENT_PER_PROVIDER), got: {result:?}"
        );
    }

    #[test]
    fn max_retries_override() {
        let mut map = HashMap::new();
        map.insert("AIVIS_MAX_RETRIES", "0");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.max_retries, 0);
    }

    #[test]
    fn max_retries_invalid() {
        let mut map = HashMap::new();
        map.insert("AIVIS_MAX_RETRIES", "-1");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "AIVIS_MAX_RETRIES"),
            "expected InvalidEnvVar(AIVIS_MAX_RETRIES), got: {result:?}"
        );
    }

    #[test]
    fn report_output_path_is_optional() {
        let mut map = HashMap::new();
        map.insert("AIVIS_REPORT_OUTPUT_PATH", "/var/log/aivis/last-report.txt");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(
            cfg.report_output_path.as_deref().map(|p| p.to_string_lossy().into_owned()),
            Some("/var/log/aivis/last-report.txt".to_string())
        );
    }

    #[test]
    fn parse_failure_policy_variants() {
        assert_eq!(
            parse_failure_policy("exclude").unwrap(),
            FailurePolicy::Exclude
        );
        assert_eq!(
            parse_failure_policy("count-as-absent").unwrap(),
            FailurePolicy::CountAsAbsent
        );
        assert_eq!(
            parse_failure_policy("COUNT_AS_ABSENT").unwrap(),
            FailurePolicy::CountAsAbsent
        );
    }

    #[test]
    fn parse_failure_policy_unknown_fails() {
        let err = parse_failure_policy("ignore").unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "AIVIS_FAILURE_POLICY")
        );
    }

    #[test]
    fn failure_policy_display_round_trips_through_parser() {
        for policy in [FailurePolicy::Exclude, FailurePolicy::CountAsAbsent] {
            assert_eq!(parse_failure_policy(&policy.to_string()).unwrap(), policy);
        }
    }
}
