//! `bdmetrics filter`: restrict CSV scan exports to a project group.
//!
//! Loads every CSV of a zip archive, resolves the group, keeps only rows whose
//! `projectName` belongs to it, and writes the result to
//! `<OUTPUT>/filtered_<timestamp>_<group>/`.
//!
//! ```bash
//! bdmetrics filter heatmap.zip --project-group "Platform" -o reports/
//! ```

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::info;

use super::resolve::{outcome_for, print_failures, print_outcome, resolve_with_progress};
use super::{CliConfig, HubArgs, Outcome};
use crate::dataset::Dataset;
use crate::filter::{FilterSummary, apply_filter, to_name_set};
use crate::resolver::CancelToken;
use crate::utils::output_dir_name;

#[derive(Args, Debug)]
pub struct FilterCommand {
    /// Zip archive of CSV scan exports
    zip_file: PathBuf,

    /// Exact name of the project group to keep
    #[arg(short = 'g', long, value_name = "GROUP")]
    project_group: String,

    /// Folder receiving the filtered output [default: current directory]
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    #[command(flatten)]
    hub: HubArgs,
}

/// Reject paths that are missing or not `.zip` before touching the network.
fn validate_archive_path(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }
    if !path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("zip")) {
        bail!("File must be a zip archive: {}", path.display());
    }
    Ok(())
}

fn print_filter_summary(summary: &FilterSummary) {
    eprintln!("Filtered data: {summary}");
    for name in &summary.passed_through {
        eprintln!(
            "  {} '{}' has no projectName column and was kept unfiltered",
            "Note:".yellow(),
            name
        );
    }
}

impl FilterCommand {
    pub async fn execute(self, config: &CliConfig, cancel: CancelToken) -> Result<Outcome> {
        validate_archive_path(&self.zip_file)?;

        info!("Reading CSV files from {}", self.zip_file.display());
        let archive = self.zip_file.clone();
        let dataset = tokio::task::spawn_blocking(move || Dataset::load_zip(&archive))
            .await
            .context("Archive loading task failed")??;

        let report = resolve_with_progress(&self.hub, config, &self.project_group, cancel).await?;
        print_failures(&report);

        let outcome = outcome_for(&report);
        if outcome != Outcome::Success {
            print_outcome(outcome, &self.project_group);
            return Ok(outcome);
        }
        eprintln!("{} {}", "✓".green(), report.summary);

        let names = to_name_set(report.projects());
        let (filtered, summary) = apply_filter(dataset, &names);
        print_filter_summary(&summary);

        if filtered.is_empty_rows() {
            print_outcome(Outcome::NoDataAfterFilter, &self.project_group);
            return Ok(Outcome::NoDataAfterFilter);
        }

        let base = self.output.unwrap_or_else(|| PathBuf::from("."));
        let out_dir = base.join(output_dir_name(&chrono::Local::now(), &self.project_group));
        let target = out_dir.clone();
        tokio::task::spawn_blocking(move || filtered.write_csv_dir(&target))
            .await
            .context("Output writing task failed")??;

        println!("{}", out_dir.display());
        eprintln!(
            "{} Wrote {} rows to {}",
            "✓".green(),
            summary.rows_after,
            out_dir.display()
        );
        Ok(Outcome::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_archive_path() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.zip");
        assert!(validate_archive_path(&missing).unwrap_err().to_string().contains("File not found"));

        let text = temp.path().join("data.txt");
        std::fs::write(&text, "x").unwrap();
        assert!(validate_archive_path(&text).unwrap_err().to_string().contains("zip archive"));

        let zip = temp.path().join("data.ZIP");
        std::fs::write(&zip, "x").unwrap();
        assert!(validate_archive_path(&zip).is_ok());
    }
}
