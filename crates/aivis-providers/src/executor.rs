//! Fan-out of the prompt catalog across every provider.
//!
//! Every (prompt, provider) pair runs as its own task. A semaphore per provider
//! caps in-flight calls to that provider; providers never wait on each other.
//! Each task returns its outcome, and the collector merges results once, so
//! the only shared state between tasks is a per-provider "credential rejected"
//! flag.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aivis_core::{ErrorKind, Prompt, Provider, QueryOutcome};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::client::ProviderClient;

/// Time and concurrency budget for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Budget for a single HTTP attempt.
    pub request_timeout: Duration,
    /// Wall-clock budget for the whole cross-product.
    pub run_timeout: Duration,
    pub max_concurrent_per_provider: usize,
}

impl ExecutorConfig {
    #[must_use]
    pub fn from_app_config(config: &aivis_core::AppConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            run_timeout: Duration::from_secs(config.run_timeout_secs),
            max_concurrent_per_provider: config.max_concurrent_per_provider,
        }
    }
}

pub struct QueryExecutor {
    clients: Vec<Arc<dyn ProviderClient>>,
    config: ExecutorConfig,
}

impl QueryExecutor {
    #[must_use]
    pub fn new(clients: Vec<Arc<dyn ProviderClient>>, config: ExecutorConfig) -> Self {
        Self { clients, config }
    }

    /// Providers in the order their clients were registered.
    #[must_use]
    pub fn providers(&self) -> Vec<Provider> {
        self.clients.iter().map(|c| c.provider()).collect()
    }

    /// Query every prompt against every provider.
    ///
    /// Returns exactly `prompts.len() × providers` outcomes ordered by prompt,
    /// then provider. Slots still running when the run deadline expires are
    /// aborted and recorded as [`ErrorKind::Timeout`]; a task that dies
    /// without an outcome is recorded as [`ErrorKind::NetworkError`].
    pub async fn run(&self, prompts: &[Prompt]) -> Vec<QueryOutcome> {
        let deadline = Instant::now() + self.config.run_timeout;
        let permits = self.config.max_concurrent_per_provider.max(1);
        let mut set = JoinSet::new();

        for client in &self.clients {
            let semaphore = Arc::new(Semaphore::new(permits));
            let auth_rejected = Arc::new(AtomicBool::new(false));

            for prompt in prompts {
                let client = Arc::clone(client);
                let semaphore = Arc::clone(&semaphore);
                let auth_rejected = Arc::clone(&auth_rejected);
                let prompt = prompt.clone();
                let request_timeout = self.config.request_timeout;

                set.spawn(async move {
                    let provider = client.provider();
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return QueryOutcome::failure(prompt.id, provider, ErrorKind::NetworkError);
                    };

                    if auth_rejected.load(Ordering::Acquire) {
                        tracing::debug!(
                            provider = %provider,
                            prompt_id = prompt.id,
                            "skipping call — credential already rejected this run"
                        );
                        return QueryOutcome::failure(prompt.id, provider, ErrorKind::AuthError);
                    }

                    let outcome = client.query(&prompt, request_timeout).await;
                    if outcome.error_kind() == Some(ErrorKind::AuthError)
                        && !auth_rejected.swap(true, Ordering::AcqRel)
                    {
                        tracing::error!(
                            provider = %provider,
                            "credential rejected — skipping remaining calls to this provider"
                        );
                    }
                    outcome
                });
            }
        }

        let mut collected: BTreeMap<(usize, Provider), QueryOutcome> = BTreeMap::new();
        let mut deadline_hit = false;

        loop {
            match tokio::time::timeout_at(deadline, set.join_next()).await {
                Ok(Some(Ok(outcome))) => {
                    collected
                        .entry((outcome.prompt_id, outcome.provider))
                        .or_insert(outcome);
                }
                Ok(Some(Err(err))) => {
                    tracing::error!(error = %err, "query task ended without an outcome");
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        unfinished = set.len(),
                        run_timeout_secs = self.config.run_timeout.as_secs(),
                        "run deadline reached — aborting unfinished queries"
                    );
                    deadline_hit = true;
                    set.abort_all();
                    break;
                }
            }
        }

        let missing_kind = if deadline_hit {
            ErrorKind::Timeout
        } else {
            ErrorKind::NetworkError
        };

        let mut outcomes = Vec::with_capacity(prompts.len() * self.clients.len());
        for prompt in prompts {
            for client in &self.clients {
                let provider = client.provider();
                let outcome = collected
                    .remove(&(prompt.id, provider))
                    .unwrap_or_else(|| QueryOutcome::failure(prompt.id, provider, missing_kind));
                outcomes.push(outcome);
            }
        }
        outcomes
    }
}
