//! Renders a [`WeeklyReport`] as Slack `mrkdwn` text.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use aivis_core::{ErrorKind, FailurePolicy, Provider};

use crate::aggregate::{ProviderScore, WeeklyReport};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const BAR_WIDTH: usize = 10;
const PROMPT_DISPLAY_CHARS: usize = 72;

/// Display limits for the list sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub max_hits: usize,
    pub max_gaps: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            max_hits: 8,
            max_gaps: 6,
        }
    }
}

/// Render the report. Pure: the same report and options give the same text.
#[must_use]
pub fn format_report(report: &WeeklyReport, options: &FormatOptions) -> String {
    let failure_kinds = failure_kinds_by_provider(report);
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!(
        "🚛 *{} AI Visibility Report* — Week of {}",
        report.brand, report.run_label
    ));
    lines.push(RULE.to_owned());
    lines.push(format!(
        "*Overall: {}/{} prompts ({})*",
        report.overall_count,
        report.overall_denominator(),
        percent_label(report.overall_percent)
    ));

    let failed = report.failed_slots();
    if failed > 0 {
        let treatment = match report.failure_policy {
            FailurePolicy::Exclude => "are excluded from the percentages",
            FailurePolicy::CountAsAbsent => "are counted as no mention",
        };
        lines.push(format!(
            "_{failed} of {} queries failed and {treatment}_",
            report.total_slots
        ));
    }

    lines.push(String::new());
    lines.push("*By Platform:*".to_owned());
    for score in &report.providers {
        let kinds = failure_kinds.get(&score.provider);
        lines.push(platform_line(score, report.failure_policy, kinds));
    }

    lines.push(String::new());
    let hits_header = format!("*✅ Prompts Where {} Appeared:*", report.brand);
    if report.hits.is_empty() {
        lines.push(format!("{hits_header} None this week — keep publishing!"));
    } else {
        lines.push(hits_header);
        for hit in report.hits.iter().take(options.max_hits) {
            let providers: Vec<&str> = hit.providers.iter().map(|p| p.label()).collect();
            lines.push(format!(
                "  • _{}_ ({})",
                truncate_chars(&hit.prompt.text, PROMPT_DISPLAY_CHARS),
                providers.join(", ")
            ));
        }
        if report.hits.len() > options.max_hits {
            lines.push(format!(
                "  _...and {} more_",
                report.hits.len() - options.max_hits
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "*❌ Visibility Gaps — {} prompts with no mention:*",
        report.gaps.len()
    ));
    for gap in report.gaps.iter().take(options.max_gaps) {
        let note = if gap.answered == 0 { ", no answers" } else { "" };
        lines.push(format!(
            "  • _{}_ ({}{note})",
            truncate_chars(&gap.prompt.text, PROMPT_DISPLAY_CHARS),
            gap.prompt.category
        ));
    }
    if report.gaps.len() > options.max_gaps {
        lines.push(format!(
            "  _...and {} more_",
            report.gaps.len() - options.max_gaps
        ));
    }

    if !failure_kinds.is_empty() {
        lines.push(String::new());
        lines.push("*⚠️ Failed Queries:*".to_owned());
        for (provider, kinds) in &failure_kinds {
            let parts: Vec<String> = kinds
                .iter()
                .map(|(kind, count)| format!("{count} × {kind}"))
                .collect();
            lines.push(format!("  • {}: {}", provider.label(), parts.join(", ")));
        }
    }

    let platforms: Vec<&str> = report.providers.iter().map(|s| s.provider.label()).collect();
    lines.push(String::new());
    lines.push(format!(
        "_Platforms: {} · {} prompts each · {} total queries_",
        platforms.join(" · "),
        report.prompt_count,
        report.total_slots
    ));

    lines.join("\n")
}

/// `█` for every full ten percent, `░` for the rest.
#[must_use]
pub fn progress_bar(percent: u32) -> String {
    let filled = usize::try_from(percent / 10).unwrap_or(BAR_WIDTH).min(BAR_WIDTH);
    let mut bar = "█".repeat(filled);
    bar.push_str(&"░".repeat(BAR_WIDTH - filled));
    bar
}

fn platform_line(
    score: &ProviderScore,
    policy: FailurePolicy,
    kinds: Option<&BTreeMap<ErrorKind, usize>>,
) -> String {
    let label = score.provider.label();
    let Some(pct) = score.percent else {
        let mut line = format!(
            "  • {label}: unavailable — {}/{} queries failed",
            score.failed, score.total
        );
        if let Some(kind) = kinds.and_then(dominant_kind) {
            let _ = write!(line, " ({kind})");
        }
        return line;
    };

    let mut line = format!(
        "  • {label}: {}/{} ({pct}%)  `{}`",
        score.mentioned,
        score.denominator(policy),
        progress_bar(pct)
    );
    if score.failed > 0 {
        let _ = write!(line, " · {} failed", score.failed);
    }
    line
}

fn percent_label(percent: Option<u32>) -> String {
    percent.map_or_else(|| "n/a".to_owned(), |p| format!("{p}%"))
}

/// Most frequent failure kind; ties go to the earlier kind.
fn dominant_kind(kinds: &BTreeMap<ErrorKind, usize>) -> Option<ErrorKind> {
    kinds
        .iter()
        .fold(None, |best: Option<(ErrorKind, usize)>, (&kind, &count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((kind, count)),
        })
        .map(|(kind, _)| kind)
}

fn failure_kinds_by_provider(report: &WeeklyReport) -> BTreeMap<Provider, BTreeMap<ErrorKind, usize>> {
    let mut grouped: BTreeMap<Provider, BTreeMap<ErrorKind, usize>> = BTreeMap::new();
    for failure in &report.failures {
        *grouped
            .entry(failure.provider)
            .or_default()
            .entry(failure.error_kind)
            .or_default() += 1;
    }
    grouped
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
