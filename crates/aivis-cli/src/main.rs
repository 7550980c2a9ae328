mod run;

use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::run::{RunOptions, RunStatus};

#[derive(Debug, Parser)]
#[command(name = "aivis")]
#[command(about = "Weekly AI visibility report: ask AI assistants, count brand mentions, post to Slack")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Query every provider, build the report and deliver it (default).
    Run {
        /// Print the report without posting it.
        #[arg(long)]
        dry_run: bool,
        /// Report label; defaults to today's date.
        #[arg(long)]
        label: Option<String>,
    },
    /// Validate and print the prompt catalog.
    Catalog,
}

/// Exit codes: `0` success, `1` the report could not be produced, `2` the
/// report was produced but delivery failed.
#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = aivis_core::load_app_config().context("failed to load configuration")?;

    // stdout carries only the report.
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(?config, "configuration loaded");

    match cli.command.unwrap_or(Commands::Run {
        dry_run: false,
        label: None,
    }) {
        Commands::Run { dry_run, label } => {
            let options = RunOptions {
                label: label.unwrap_or_else(default_label),
                dry_run,
            };
            let status = run::run_report(&config, &options).await?;
            Ok(status.exit_code())
        }
        Commands::Catalog => {
            run::print_catalog(&config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn default_label() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

impl RunStatus {
    /// `0` delivered or dry run, `2` delivery failed.
    fn exit_code(self) -> ExitCode {
        match self {
            RunStatus::Delivered | RunStatus::DryRun => ExitCode::SUCCESS,
            RunStatus::DeliveryFailed => ExitCode::from(2),
        }
    }
}
