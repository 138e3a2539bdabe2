//! `bdmetrics resolve`: list the projects beneath a project group.
//!
//! # Examples
//!
//! ```bash
//! # Project names, one per line
//! bdmetrics resolve "Platform" --bd-url https://blackduck.example.com
//!
//! # The full project set with diagnostics as JSON
//! bdmetrics resolve "Platform" --format json > platform.json
//! ```

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use serde::Serialize;

use super::{CliConfig, HubArgs, Outcome};
use crate::resolver::{
    CancelToken, ProjectSet, ResolveReport, ResolveSummary, TraversalFailure, resolve_group,
};
use crate::utils::ProgressBar;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Project names on stdout, diagnostics on stderr
    #[default]
    Text,
    /// One JSON document with projects, summary and failures
    Json,
}

#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// Exact name of the project group
    group: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(flatten)]
    hub: HubArgs,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveOutput<'a> {
    group: &'a str,
    complete: bool,
    summary: &'a ResolveSummary,
    projects: &'a ProjectSet,
    failures: &'a [TraversalFailure],
}

/// How a resolution ends the command.
pub(super) fn outcome_for(report: &ResolveReport) -> Outcome {
    if !report.group_found() {
        Outcome::NoMatchingGroup
    } else if report.projects().is_empty() {
        Outcome::NoProjects
    } else {
        Outcome::Success
    }
}

/// Resolve `group` behind a spinner.
pub(super) async fn resolve_with_progress(
    hub: &HubArgs,
    config: &CliConfig,
    group: &str,
    cancel: CancelToken,
) -> Result<ResolveReport> {
    let hub_config = hub.load_config(config).await?;

    let spinner = ProgressBar::new_spinner(config.show_progress());
    spinner.set_message(format!("Resolving project group '{group}'..."));
    let report = resolve_group(&hub_config, group, Some(cancel)).await;
    spinner.finish_and_clear();

    report.with_context(|| format!("Failed to resolve project group '{group}'"))
}

/// Print skipped subtrees and projects as warnings.
pub(super) fn print_failures(report: &ResolveReport) {
    if report.is_complete() {
        return;
    }
    eprintln!(
        "{} Resolution of '{}' is incomplete:",
        "Warning:".yellow().bold(),
        report.group
    );
    for failure in report.failures() {
        eprintln!("  {} {}", "-".yellow(), failure.error);
    }
}

/// Explain an unsuccessful outcome on stderr.
pub(super) fn print_outcome(outcome: Outcome, group: &str) {
    match outcome {
        Outcome::NoMatchingGroup => eprintln!(
            "{} No project group named '{}' was found",
            "Error:".red().bold(),
            group
        ),
        Outcome::NoProjects => eprintln!(
            "{} Project group '{}' contains no projects",
            "Error:".red().bold(),
            group
        ),
        Outcome::NoDataAfterFilter => eprintln!(
            "{} No data remaining after filtering by project group '{}'",
            "Error:".red().bold(),
            group
        ),
        Outcome::Success => {}
    }
}

impl ResolveCommand {
    pub async fn execute(self, config: &CliConfig, cancel: CancelToken) -> Result<Outcome> {
        let report = resolve_with_progress(&self.hub, config, &self.group, cancel).await?;
        let outcome = outcome_for(&report);

        match self.format {
            OutputFormat::Json => {
                let output = ResolveOutput {
                    group: &report.group,
                    complete: report.is_complete(),
                    summary: &report.summary,
                    projects: report.projects(),
                    failures: report.failures(),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                for project in report.projects() {
                    println!("{}", project.name);
                }
                print_failures(&report);
                if outcome == Outcome::Success {
                    eprintln!("{} {}", "✓".green(), report.summary);
                }
            }
        }

        print_outcome(outcome, &self.group);
        Ok(outcome)
    }
}
