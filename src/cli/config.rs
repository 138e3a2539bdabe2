//! `bdmetrics config`: inspect or create the configuration file.
//!
//! ```bash
//! bdmetrics config init          # write an example to ~/.bdmetrics/config.toml
//! bdmetrics config show          # effective settings, secrets redacted
//! bdmetrics config path          # where the file is read from
//! ```

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use super::{CliConfig, Outcome};
use crate::config::{Credentials, HubConfig};

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: Option<ConfigSubcommands>,
}

#[derive(Subcommand, Debug)]
enum ConfigSubcommands {
    /// Write an example config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration (default)
    Show,

    /// Print the config file location
    Path,
}

fn config_path(cli: &CliConfig) -> Result<PathBuf> {
    match &cli.config_path {
        Some(path) => Ok(path.clone()),
        None => HubConfig::default_path(),
    }
}

/// Copy of `config` with every secret replaced by a placeholder.
fn redacted(config: &HubConfig) -> HubConfig {
    let mask = |value: &Option<String>| value.as_ref().map(|_| "<redacted>".to_string());
    HubConfig {
        credentials: Credentials {
            api_token: mask(&config.credentials.api_token),
            username: config.credentials.username.clone(),
            password: mask(&config.credentials.password),
        },
        ..config.clone()
    }
}

impl ConfigCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<Outcome> {
        match self.command {
            Some(ConfigSubcommands::Init {
                force,
            }) => Self::init(cli, force).await,
            Some(ConfigSubcommands::Show) | None => Self::show(cli).await,
            Some(ConfigSubcommands::Path) => {
                println!("{}", config_path(cli)?.display());
                Ok(Outcome::Success)
            }
        }
    }

    async fn init(cli: &CliConfig, force: bool) -> Result<Outcome> {
        let path = config_path(cli)?;
        if path.exists() && !force {
            bail!("Config already exists at {} (use --force to overwrite)", path.display());
        }

        let example =
            HubConfig::new("https://blackduck.example.com", Credentials::token("YOUR_API_TOKEN"));
        example.save_to(&path).await?;

        println!("{} Created config at: {}", "✓".green(), path.display());
        println!("\n{}", "Next steps:".yellow());
        println!("  1. Set base_url to your Black Duck server");
        println!("  2. Replace 'YOUR_API_TOKEN' with an API token, or use BD_API_TOKEN instead");
        Ok(Outcome::Success)
    }

    async fn show(cli: &CliConfig) -> Result<Outcome> {
        let path = config_path(cli)?;
        let config = HubConfig::load_with_optional(Some(path.clone()))
            .await?
            .with_env_overrides(|key| std::env::var(key).ok());

        println!("{}", "bdmetrics configuration".bold());
        println!("Location: {}", path.display());
        if !path.exists() {
            println!("{}", "(file not found, showing defaults and environment)".dimmed());
        }
        println!("\n{}", toml::to_string_pretty(&redacted(&config))?);
        Ok(Outcome::Success)
    }
}
