//! Folds a run's outcomes into the weekly scorecard.

use std::collections::HashMap;

use aivis_core::{ErrorKind, FailurePolicy, Prompt, PromptCatalog, Provider, QueryOutcome, QueryStatus};

use crate::detector::MentionDetector;

/// Per-provider tally for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderScore {
    pub provider: Provider,
    /// Answered calls whose text mentioned the brand.
    pub mentioned: usize,
    /// Calls that returned an answer.
    pub answered: usize,
    /// Calls that ended in a failure.
    pub failed: usize,
    /// Prompts in the catalog.
    pub total: usize,
    /// `None` when the provider is unavailable: no answered calls under
    /// [`FailurePolicy::Exclude`], or an empty catalog.
    pub percent: Option<u32>,
}

impl ProviderScore {
    /// Denominator shown next to `mentioned` for the active policy.
    #[must_use]
    pub fn denominator(&self, policy: FailurePolicy) -> usize {
        match policy {
            FailurePolicy::Exclude => self.answered,
            FailurePolicy::CountAsAbsent => self.total,
        }
    }
}

/// A prompt where at least one provider mentioned the brand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub prompt: Prompt,
    /// Mentioning providers in canonical order.
    pub providers: Vec<Provider>,
}

/// A prompt with no mentioning answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gap {
    pub prompt: Prompt,
    /// Providers that answered this prompt. Zero means every call failed.
    pub answered: usize,
}

/// One (prompt, provider) call that produced no answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedQuery {
    pub prompt: Prompt,
    pub provider: Provider,
    pub error_kind: ErrorKind,
}

/// The aggregated result of one run. Built once by [`aggregate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyReport {
    pub run_label: String,
    pub brand: String,
    pub prompt_count: usize,
    pub providers: Vec<ProviderScore>,
    /// Mentioning (prompt, provider) pairs across all providers.
    pub overall_count: usize,
    pub answered_slots: usize,
    pub total_slots: usize,
    pub overall_percent: Option<u32>,
    pub failure_policy: FailurePolicy,
    /// Catalog order.
    pub hits: Vec<Hit>,
    /// Grouped by category in catalog order, then by catalog index.
    pub gaps: Vec<Gap>,
    /// Catalog order, then provider order.
    pub failures: Vec<FailedQuery>,
}

impl WeeklyReport {
    /// Denominator of the overall line for the active policy.
    #[must_use]
    pub fn overall_denominator(&self) -> usize {
        match self.failure_policy {
            FailurePolicy::Exclude => self.answered_slots,
            FailurePolicy::CountAsAbsent => self.total_slots,
        }
    }

    #[must_use]
    pub fn failed_slots(&self) -> usize {
        self.failures.len()
    }

    #[must_use]
    pub fn score(&self, provider: Provider) -> Option<&ProviderScore> {
        self.providers.iter().find(|s| s.provider == provider)
    }
}

/// Round-half-up integer percentage, `None` for a zero denominator.
#[must_use]
pub fn percent(numerator: usize, denominator: usize) -> Option<u32> {
    if denominator == 0 {
        return None;
    }
    let value = (numerator.saturating_mul(100) + denominator / 2) / denominator;
    Some(u32::try_from(value).unwrap_or(u32::MAX))
}

/// Build the report for `catalog` from a run's `outcomes`.
///
/// Outcomes may arrive in any order. The first outcome for a slot wins;
/// a slot with no outcome is counted as a [`ErrorKind::Timeout`] failure.
/// Outcomes for prompt ids outside the catalog are ignored.
#[must_use]
pub fn aggregate(
    catalog: &PromptCatalog,
    outcomes: &[QueryOutcome],
    detector: &MentionDetector,
    run_label: &str,
    policy: FailurePolicy,
) -> WeeklyReport {
    let prompt_count = catalog.len();

    let mut slots: HashMap<(usize, Provider), &QueryStatus> = HashMap::with_capacity(outcomes.len());
    for outcome in outcomes {
        if outcome.prompt_id >= prompt_count {
            tracing::warn!(
                prompt_id = outcome.prompt_id,
                provider = %outcome.provider,
                "ignoring outcome for unknown prompt"
            );
            continue;
        }
        slots
            .entry((outcome.prompt_id, outcome.provider))
            .or_insert(&outcome.status);
    }

    let mut scores: Vec<ProviderScore> = Provider::ALL
        .iter()
        .map(|&provider| ProviderScore {
            provider,
            mentioned: 0,
            answered: 0,
            failed: 0,
            total: prompt_count,
            percent: None,
        })
        .collect();

    let mut hits = Vec::new();
    let mut gaps = Vec::new();
    let mut failures = Vec::new();

    for prompt in catalog.prompts() {
        let mut mentioned_by = Vec::new();
        let mut answered = 0usize;

        for score in &mut scores {
            let provider = score.provider;
            match slots.get(&(prompt.id, provider)) {
                Some(QueryStatus::Success { response_text }) => {
                    score.answered += 1;
                    answered += 1;
                    if detector.detect(response_text) {
                        score.mentioned += 1;
                        mentioned_by.push(provider);
                    }
                }
                Some(QueryStatus::Failure { error_kind }) => {
                    score.failed += 1;
                    failures.push(FailedQuery {
                        prompt: prompt.clone(),
                        provider,
                        error_kind: *error_kind,
                    });
                }
                None => {
                    tracing::warn!(
                        prompt_id = prompt.id,
                        provider = %provider,
                        "no outcome recorded; counting as timeout"
                    );
                    score.failed += 1;
                    failures.push(FailedQuery {
                        prompt: prompt.clone(),
                        provider,
                        error_kind: ErrorKind::Timeout,
                    });
                }
            }
        }

        if mentioned_by.is_empty() {
            gaps.push(Gap {
                prompt: prompt.clone(),
                answered,
            });
        } else {
            hits.push(Hit {
                prompt: prompt.clone(),
                providers: mentioned_by,
            });
        }
    }

    gaps.sort_by_key(|gap| {
        (
            catalog.category_rank(&gap.prompt.category).unwrap_or(usize::MAX),
            gap.prompt.id,
        )
    });

    for score in &mut scores {
        score.percent = percent(score.mentioned, score.denominator(policy));
    }

    let overall_count = scores.iter().map(|s| s.mentioned).sum();
    let answered_slots = scores.iter().map(|s| s.answered).sum();
    let total_slots = prompt_count * scores.len();
    let overall_denominator = match policy {
        FailurePolicy::Exclude => answered_slots,
        FailurePolicy::CountAsAbsent => total_slots,
    };

    WeeklyReport {
        run_label: run_label.to_owned(),
        brand: catalog.brand().to_owned(),
        prompt_count,
        providers: scores,
        overall_count,
        answered_slots,
        total_slots,
        overall_percent: percent(overall_count, overall_denominator),
        failure_policy: policy,
        hits,
        gaps,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use aivis_core::parse_catalog;

    use super::*;

    const CATALOG: &str = r"
brand: fleetTEC
variants: [fleettec, fleet tec]
categories:
  - name: Upfitting
    prompts:
      - Who upfits police cars?
      - Best ambulance upfitters?
  - name: Telematics
    prompts:
      - Which GPS trackers suit fleets?
";

    fn catalog() -> PromptCatalog {
        parse_catalog(CATALOG).unwrap()
    }

    fn detector() -> MentionDetector {
        MentionDetector::new(&["fleettec", "fleet tec"]).unwrap()
    }

    fn answer(prompt_id: usize, provider: Provider, text: &str) -> QueryOutcome {
        QueryOutcome::success(prompt_id, provider, text)
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(4, 75), Some(5));
        assert_eq!(percent(2, 25), Some(8));
        assert_eq!(percent(1, 24), Some(4));
        assert_eq!(percent(1, 8), Some(13));
        assert_eq!(percent(1, 3), Some(33));
        assert_eq!(percent(2, 3), Some(67));
        assert_eq!(percent(0, 0), None);
    }

    #[test]
    fn missing_slots_count_as_timeouts() {
        let outcomes = vec![answer(0, Provider::OpenAi, "FleetTEC")];
        let report = aggregate(&catalog(), &outcomes, &detector(), "w", FailurePolicy::Exclude);

        assert_eq!(report.total_slots, 9);
        assert_eq!(report.failures.len(), 8);
        assert!(report
            .failures
            .iter()
            .all(|f| f.error_kind == ErrorKind::Timeout));
    }

    #[test]
    fn duplicate_outcomes_keep_the_first() {
        let outcomes = vec![
            answer(0, Provider::OpenAi, "nothing here"),
            answer(0, Provider::OpenAi, "FleetTEC!"),
        ];
        let report = aggregate(&catalog(), &outcomes, &detector(), "w", FailurePolicy::Exclude);

        assert_eq!(report.score(Provider::OpenAi).unwrap().mentioned, 0);
        assert_eq!(report.score(Provider::OpenAi).unwrap().answered, 1);
    }

    #[test]
    fn outcomes_for_unknown_prompts_are_ignored() {
        let outcomes = vec![answer(99, Provider::Gemini, "fleettec")];
        let report = aggregate(&catalog(), &outcomes, &detector(), "w", FailurePolicy::Exclude);
        assert_eq!(report.overall_count, 0);
        assert_eq!(report.hits.len(), 0);
    }

    #[test]
    fn hit_lists_mentioning_providers_in_canonical_order() {
        let outcomes = vec![
            answer(1, Provider::Gemini, "fleet tec"),
            answer(1, Provider::OpenAi, "FleetTec"),
            answer(1, Provider::Anthropic, "no idea"),
        ];
        let report = aggregate(&catalog(), &outcomes, &detector(), "w", FailurePolicy::Exclude);

        assert_eq!(report.hits.len(), 1);
        assert_eq!(report.hits[0].prompt.id, 1);
        assert_eq!(
            report.hits[0].providers,
            vec![Provider::OpenAi, Provider::Gemini]
        );
    }

    #[test]
    fn gap_answered_count_marks_unanswered_prompts() {
        let outcomes = vec![
            answer(0, Provider::OpenAi, "no"),
            QueryOutcome::failure(0, Provider::Anthropic, ErrorKind::AuthError),
            answer(0, Provider::Gemini, "no"),
        ];
        let report = aggregate(&catalog(), &outcomes, &detector(), "w", FailurePolicy::Exclude);

        let first = report.gaps.iter().find(|g| g.prompt.id == 0).unwrap();
        assert_eq!(first.answered, 2);
        let third = report.gaps.iter().find(|g| g.prompt.id == 2).unwrap();
        assert_eq!(third.answered, 0);
    }

    #[test]
    fn count_as_absent_uses_full_denominators() {
        let outcomes = vec![
            answer(0, Provider::OpenAi, "fleettec"),
            QueryOutcome::failure(1, Provider::OpenAi, ErrorKind::RateLimited),
            QueryOutcome::failure(2, Provider::OpenAi, ErrorKind::RateLimited),
        ];

        let excluded = aggregate(&catalog(), &outcomes, &detector(), "w", FailurePolicy::Exclude);
        let absent =
            aggregate(&catalog(), &outcomes, &detector(), "w", FailurePolicy::CountAsAbsent);

        assert_eq!(excluded.score(Provider::OpenAi).unwrap().percent, Some(100));
        assert_eq!(absent.score(Provider::OpenAi).unwrap().percent, Some(33));
        // No Claude outcomes at all: unavailable under Exclude, 0% otherwise.
        assert_eq!(excluded.score(Provider::Anthropic).unwrap().percent, None);
        assert_eq!(absent.score(Provider::Anthropic).unwrap().percent, Some(0));
        assert_eq!(excluded.overall_percent, Some(100));
        assert_eq!(absent.overall_percent, Some(11));
    }
}
