//! Bounded retry with exponential back-off and jitter for provider calls.
//!
//! [`retry_with_backoff`] wraps one provider request and retries it on
//! transient errors (rate limiting, network failures, timeouts, 5xx).
//! Credential and response-shape errors are returned immediately: the same
//! request would fail the same way.

use std::future::Future;
use std::time::Duration;

use aivis_core::Provider;

use crate::error::ProviderError;

const MAX_DELAY_MS: u64 = 60_000;

/// Retry policy attached to every provider client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Base delay for exponential back-off: `base × 2^(retry - 1)`.
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base_ms: 1_000,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_base_ms: 0,
        }
    }

    /// Un-jittered delay before retry number `retry` (1-based), capped at 60 s.
    ///
    /// With the default base of 1 000 ms the schedule is 1 s, 2 s, 4 s, …
    #[must_use]
    pub fn base_delay_ms(&self, retry: u32) -> u64 {
        let exponent = retry.saturating_sub(1).min(16);
        self.backoff_base_ms
            .saturating_mul(1u64 << exponent)
            .min(MAX_DELAY_MS)
    }
}

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - [`ProviderError::RateLimited`]: HTTP 429.
/// - [`ProviderError::Http`]: timeouts, connection resets, body read failures.
/// - [`ProviderError::UnexpectedStatus`] with a 5xx status.
///
/// **Not retriable:**
/// - [`ProviderError::MissingCredential`] / [`ProviderError::Unauthorized`]:
///   the key will not become valid mid-run.
/// - [`ProviderError::Malformed`] and 4xx statuses: same request, same answer.
/// - [`ProviderError::InvalidBaseUrl`]: configuration problem.
pub(crate) fn is_retriable(err: &ProviderError) -> bool {
    match err {
        ProviderError::RateLimited { .. } => true,
        ProviderError::Http(e) => !e.is_decode() && !e.is_builder(),
        ProviderError::UnexpectedStatus { status, .. } => *status >= 500,
        ProviderError::MissingCredential { .. }
        | ProviderError::Unauthorized { .. }
        | ProviderError::Malformed { .. }
        | ProviderError::InvalidBaseUrl { .. } => false,
    }
}

/// Runs `operation` with up to `policy.max_retries` additional attempts on
/// transient errors, sleeping `base × 2^(retry - 1)` ± 25 % between attempts.
///
/// Non-retriable errors and the last error after exhaustion are returned
/// unchanged.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    provider: Provider,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= policy.max_retries {
                    return Err(err);
                }
                attempt += 1;
                let capped = policy.base_delay_ms(attempt);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    provider = %provider,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms,
                    error = %err,
                    "transient provider error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff_base_ms: 0,
        }
    }

    fn rate_limited() -> ProviderError {
        ProviderError::RateLimited {
            provider: Provider::OpenAi,
            retry_after_secs: None,
        }
    }

    #[test]
    fn default_schedule_is_one_then_two_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.base_delay_ms(1), 1_000);
        assert_eq!(policy.base_delay_ms(2), 2_000);
    }

    #[test]
    fn delay_is_capped_at_one_minute() {
        let policy = RetryPolicy {
            max_retries: 30,
            backoff_base_ms: 1_000,
        };
        assert_eq!(policy.base_delay_ms(30), MAX_DELAY_MS);
    }

    #[test]
    fn auth_errors_are_not_retriable() {
        assert!(!is_retriable(&ProviderError::Unauthorized {
            provider: Provider::Anthropic,
            status: 401
        }));
        assert!(!is_retriable(&ProviderError::MissingCredential {
            provider: Provider::Anthropic
        }));
    }

    #[test]
    fn malformed_and_client_errors_are_not_retriable() {
        assert!(!is_retriable(&ProviderError::Malformed {
            provider: Provider::Gemini,
            reason: "no candidates".to_owned()
        }));
        assert!(!is_retriable(&ProviderError::UnexpectedStatus {
            provider: Provider::Gemini,
            status: 404
        }));
    }

    #[test]
    fn rate_limits_and_server_errors_are_retriable() {
        assert!(is_retriable(&rate_limited()));
        assert!(is_retriable(&ProviderError::UnexpectedStatus {
            provider: Provider::OpenAi,
            status: 503
        }));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&policy(2), Provider::OpenAi, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ProviderError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_rate_limit_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&policy(2), Provider::OpenAi, || {
            let c = Arc::clone(&c);
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(rate_limited())
                } else {
                    Ok::<u32, ProviderError>(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn returns_last_error_after_exhausting_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&policy(2), Provider::OpenAi, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(rate_limited())
            }
        })
        .await;
        // max_retries=2 → 3 total attempts
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(ProviderError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_unauthorized() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&policy(2), Provider::Anthropic, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(ProviderError::Unauthorized {
                    provider: Provider::Anthropic,
                    status: 401,
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1, "auth errors must not be retried");
        assert!(matches!(result, Err(ProviderError::Unauthorized { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_sleeps_between_attempts() {
        let started = tokio::time::Instant::now();
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let policy = RetryPolicy {
            max_retries: 2,
            backoff_base_ms: 1_000,
        };
        let _ = retry_with_backoff(&policy, Provider::Gemini, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(rate_limited())
            }
        })
        .await;
        // 1 s and 2 s with ±25 % jitter: at least 0.75 + 1.5 seconds elapsed.
        assert!(started.elapsed() >= Duration::from_millis(2_250));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
