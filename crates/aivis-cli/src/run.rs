//! The weekly run: query, aggregate, render, deliver.
//!
//! A report that has been computed is never lost. It always goes to stdout
//! and, when configured, to the fallback file before delivery is attempted.

use std::path::{Path, PathBuf};
use std::time::Duration;

use aivis_core::{AppConfig, FailurePolicy, PromptCatalog};
use aivis_notify::{Notifier, SlackNotifier};
use aivis_providers::{build_clients, ExecutorConfig, QueryExecutor};
use aivis_report::{aggregate, format_report, FormatOptions, MentionDetector, WeeklyReport};
use anyhow::Context;

#[derive(Debug, Clone)]
pub(crate) struct RunOptions {
    pub(crate) label: String,
    pub(crate) dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunStatus {
    Delivered,
    DryRun,
    DeliveryFailed,
}

/// Everything the pipeline needs besides the executor and notifier.
#[derive(Debug, Clone)]
pub(crate) struct PipelineSettings {
    pub(crate) label: String,
    pub(crate) dry_run: bool,
    pub(crate) failure_policy: FailurePolicy,
    pub(crate) report_output_path: Option<PathBuf>,
}

/// Build the run's dependencies from configuration and execute it.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded or a client cannot be
/// constructed. Per-query and delivery failures are not errors.
pub(crate) async fn run_report(config: &AppConfig, options: &RunOptions) -> anyhow::Result<RunStatus> {
    let catalog = aivis_core::load_catalog(&config.catalog_path).with_context(|| {
        format!("failed to load catalog {}", config.catalog_path.display())
    })?;
    let clients = build_clients(config).context("failed to build provider clients")?;
    let executor = QueryExecutor::new(clients, ExecutorConfig::from_app_config(config));
    let notifier = SlackNotifier::new(
        config.slack_webhook_url.clone(),
        Duration::from_secs(config.notify_timeout_secs),
    )
    .context("failed to build Slack notifier")?;

    let settings = PipelineSettings {
        label: options.label.clone(),
        dry_run: options.dry_run,
        failure_policy: config.failure_policy,
        report_output_path: config.report_output_path.clone(),
    };
    let (_, status) = execute(&catalog, &executor, &notifier, &settings).await?;
    Ok(status)
}

/// Run the cross-product and hand the rendered report to every sink.
///
/// Returns the rendered text alongside the delivery status.
///
/// # Errors
///
/// Returns an error only if the brand variants cannot be compiled.
pub(crate) async fn execute(
    catalog: &PromptCatalog,
    executor: &QueryExecutor,
    notifier: &dyn Notifier,
    settings: &PipelineSettings,
) -> anyhow::Result<(String, RunStatus)> {
    let detector =
        MentionDetector::new(catalog.variants()).context("failed to compile brand variants")?;

    tracing::info!(
        prompts = catalog.len(),
        providers = executor.providers().len(),
        label = %settings.label,
        "starting visibility run"
    );
    let outcomes = executor.run(catalog.prompts()).await;

    let report = aggregate(
        catalog,
        &outcomes,
        &detector,
        &settings.label,
        settings.failure_policy,
    );
    log_summary(&report);

    let text = format_report(&report, &FormatOptions::default());
    println!("{text}");

    if let Some(path) = &settings.report_output_path {
        if let Err(err) = write_report_file(path, &text) {
            tracing::error!(path = %path.display(), error = %err, "failed to write report file");
        }
    }

    if settings.dry_run {
        tracing::info!("dry run; skipping delivery");
        return Ok((text, RunStatus::DryRun));
    }

    let status = match notifier.deliver(&text).await {
        Ok(()) => RunStatus::Delivered,
        Err(err) => {
            tracing::error!(error = %err, "report delivery failed; report was printed to stdout");
            RunStatus::DeliveryFailed
        }
    };
    Ok((text, status))
}

/// Print the validated catalog without touching the network.
///
/// # Errors
///
/// Returns an error if the catalog fails to load or validate.
pub(crate) fn print_catalog(config: &AppConfig) -> anyhow::Result<()> {
    let catalog = aivis_core::load_catalog(&config.catalog_path).with_context(|| {
        format!("failed to load catalog {}", config.catalog_path.display())
    })?;
    println!("{}", render_catalog(&catalog));
    Ok(())
}

pub(crate) fn render_catalog(catalog: &PromptCatalog) -> String {
    let mut lines = vec![
        format!("brand: {}", catalog.brand()),
        format!("variants: {}", catalog.variants().join(", ")),
        format!(
            "{} prompts in {} categories",
            catalog.len(),
            catalog.categories().len()
        ),
    ];
    for prompt in catalog.prompts() {
        lines.push(format!("{:>3}  [{}] {}", prompt.id, prompt.category, prompt.text));
    }
    lines.join("\n")
}

fn log_summary(report: &WeeklyReport) {
    for score in &report.providers {
        tracing::info!(
            provider = %score.provider,
            mentioned = score.mentioned,
            answered = score.answered,
            failed = score.failed,
            percent = ?score.percent,
            "provider summary"
        );
    }
    tracing::info!(
        overall = report.overall_count,
        answered_slots = report.answered_slots,
        total_slots = report.total_slots,
        hits = report.hits.len(),
        gaps = report.gaps.len(),
        "run complete"
    );
}

fn write_report_file(path: &Path, text: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)?;
    tracing::info!(path = %path.display(), "report written");
    Ok(())
}
