//! Command-line interface for bdmetrics.
//!
//! # Command Structure
//!
//! ```text
//! bdmetrics [GLOBAL OPTIONS] <COMMAND>
//!
//! Commands:
//!   resolve  List every project beneath a project group
//!   filter   Restrict a zip of CSV exports to a project group's projects
//!   config   Inspect or create the configuration file
//! ```
//!
//! # Global Options
//!
//! - `-v, --verbose`: debug logging
//! - `-q, --quiet`: errors only, no spinners
//! - `-c, --config <PATH>`: config file (also `BDMETRICS_CONFIG`)
//! - `--no-progress`: hide spinners
//!
//! # Configuration Layers
//!
//! Hub settings are read from the config file, then overridden by `BD_URL`,
//! `BD_API_TOKEN`, `BD_USERNAME`, `BD_PASSWORD`, `BD_INSECURE` and
//! `BD_TIMEOUT`, then by command-line flags.
//!
//! # Exit Codes
//!
//! Commands return an [`Outcome`] instead of exiting themselves; `main` turns
//! it, or the error, into a code from [`exit_codes`].

mod config;
pub mod exit_codes;
mod filter;
mod hub_args;
mod resolve;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

use crate::constants::env::BDMETRICS_CONFIG;
use crate::resolver::CancelToken;

pub use hub_args::HubArgs;

/// Settings shared by every command, derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log level for the tracing subscriber; `None` logs errors only
    pub log_level: Option<Level>,

    /// Hide progress spinners
    pub no_progress: bool,

    /// Explicit config file path
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether spinners may be drawn.
    pub fn show_progress(&self) -> bool {
        !self.no_progress
    }
}

/// How a command ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// No group matched the requested name
    NoMatchingGroup,
    /// The group matched but resolved to zero projects
    NoProjects,
    /// Filtering left no rows
    NoDataAfterFilter,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Success => exit_codes::EXIT_SUCCESS,
            Self::NoMatchingGroup => exit_codes::EXIT_NO_MATCHING_GROUP,
            Self::NoProjects => exit_codes::EXIT_NO_PROJECTS,
            Self::NoDataAfterFilter => exit_codes::EXIT_NO_DATA,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "bdmetrics",
    about = "Resolve Black Duck project groups and filter scan exports by them",
    version,
    long_about = "bdmetrics expands a Black Duck project group into every project nested beneath it \
                  and restricts CSV scan exports to those projects."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the config file
    #[arg(short, long, global = true, env = BDMETRICS_CONFIG)]
    config: Option<PathBuf>,

    /// Disable progress spinners
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every project beneath a project group
    Resolve(resolve::ResolveCommand),

    /// Restrict a zip of CSV exports to the projects of a project group
    Filter(filter::FilterCommand),

    /// Inspect or create the configuration file
    Config(config::ConfigCommand),
}

impl Cli {
    /// Execute with settings derived from the global flags and no cancellation.
    pub async fn execute(self) -> Result<Outcome> {
        let config = self.build_config();
        self.execute_with_config(config, CancelToken::new()).await
    }

    /// Derive the shared settings from the global flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some(Level::DEBUG)
        } else if self.quiet {
            None
        } else {
            Some(Level::INFO)
        };

        CliConfig {
            log_level,
            no_progress: self.no_progress || self.quiet,
            config_path: self.config.clone(),
        }
    }

    /// Run the selected command; `cancel` aborts a running resolution.
    ///
    /// # Errors
    ///
    /// Returns the command's error; see [`exit_codes::for_error`] for how it
    /// maps to an exit code.
    pub async fn execute_with_config(self, config: CliConfig, cancel: CancelToken) -> Result<Outcome> {
        match self.command {
            Commands::Resolve(cmd) => cmd.execute(&config, cancel).await,
            Commands::Filter(cmd) => cmd.execute(&config, cancel).await,
            Commands::Config(cmd) => cmd.execute(&config).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_levels() {
        let cli = Cli::try_parse_from(["bdmetrics", "-v", "resolve", "Platform"]).unwrap();
        assert_eq!(cli.build_config().log_level, Some(Level::DEBUG));

        let cli = Cli::try_parse_from(["bdmetrics", "resolve", "Platform", "--quiet"]).unwrap();
        let config = cli.build_config();
        assert_eq!(config.log_level, None);
        assert!(!config.show_progress());

        let cli = Cli::try_parse_from(["bdmetrics", "resolve", "Platform"]).unwrap();
        assert_eq!(cli.build_config().log_level, Some(Level::INFO));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["bdmetrics", "-v", "-q", "resolve", "Platform"]).is_err());
    }

    #[test]
    fn test_global_config_path() {
        let cli =
            Cli::try_parse_from(["bdmetrics", "resolve", "Platform", "-c", "/tmp/bd.toml"]).unwrap();
        assert_eq!(cli.build_config().config_path, Some(PathBuf::from("/tmp/bd.toml")));
    }

    #[test]
    fn test_outcome_exit_codes() {
        assert_eq!(Outcome::Success.exit_code(), 0);
        assert_eq!(Outcome::NoMatchingGroup.exit_code(), 2);
        assert_eq!(Outcome::NoProjects.exit_code(), 3);
        assert_eq!(Outcome::NoDataAfterFilter.exit_code(), 4);
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
