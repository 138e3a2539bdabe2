//! Configuration management for bdmetrics
//!
//! Hub connection settings are layered from three sources, later ones winning:
//!
//! 1. **Config file** (`~/.bdmetrics/config.toml`, or `--config` / `BDMETRICS_CONFIG`)
//! 2. **Environment** (`BD_URL`, `BD_API_TOKEN`, `BD_USERNAME`, `BD_PASSWORD`,
//!    `BD_INSECURE`, `BD_TIMEOUT`)
//! 3. **Command-line flags** (`--bd-url`, `--bd-token`, ...)
//!
//! The environment is never read by the hub client itself. The binary applies
//! it through [`HubConfig::with_env_overrides`] before a
//! [`Session`](crate::hub::Session) is opened, so library callers and tests
//! can build a [`HubConfig`] explicitly.
//!
//! # Example
//!
//! ```rust,no_run
//! use bdmetrics::config::HubConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = HubConfig::load_with_optional(None)
//!     .await?
//!     .with_env_overrides(|key| std::env::var(key).ok());
//! println!("Resolving against {:?}", config.base_url);
//! # Ok(())
//! # }
//! ```
//!
//! # Security
//!
//! The config file may contain tokens. It is written with `0600` permissions
//! on Unix and credentials are redacted from `Debug` output.

mod hub;

pub use hub::{AuthMethod, Credentials, HubConfig};
