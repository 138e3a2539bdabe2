//! Hub connection flags shared by `resolve` and `filter`.

use anyhow::Result;
use clap::Args;

use super::CliConfig;
use crate::config::HubConfig;
use crate::resolver::ErrorPolicy;

/// Flags overriding the config file and `BD_*` environment variables.
///
/// The password is only read from `BD_PASSWORD` or the config file so it
/// never shows up in the process list.
#[derive(Args, Debug, Clone, Default)]
pub struct HubArgs {
    /// Black Duck server URL
    #[arg(long, value_name = "URL")]
    pub bd_url: Option<String>,

    /// Black Duck API token
    #[arg(long, value_name = "TOKEN")]
    pub bd_token: Option<String>,

    /// Username for password authentication (password from BD_PASSWORD)
    #[arg(long, value_name = "USER")]
    pub bd_username: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure: bool,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Items per listing page (1-1000)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..=1000))]
    pub page_size: Option<u16>,

    /// Deepest nested group level to expand
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Fail on the first unreadable group or project instead of skipping it
    #[arg(long)]
    pub strict: bool,
}

impl HubArgs {
    /// Overlay these flags on `config`.
    #[must_use]
    pub fn apply(&self, mut config: HubConfig) -> HubConfig {
        if let Some(url) = &self.bd_url {
            config.base_url = Some(url.clone());
        }
        if let Some(token) = &self.bd_token {
            config.credentials.api_token = Some(token.clone());
        }
        if let Some(username) = &self.bd_username {
            config.credentials.username = Some(username.clone());
        }
        if self.insecure {
            config.insecure = true;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(page_size) = self.page_size {
            config.page_size = usize::from(page_size);
        }
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if self.strict {
            config.policy = ErrorPolicy::Strict;
        }
        config
    }

    /// Config file, then process environment, then these flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read.
    pub async fn load_config(&self, cli: &CliConfig) -> Result<HubConfig> {
        let config = HubConfig::load_with_optional(cli.config_path.clone())
            .await?
            .with_env_overrides(|key| std::env::var(key).ok());
        Ok(self.apply(config))
    }
}
