//! bdmetrics - Black Duck project group resolution
//!
//! Resolves the complete, de-duplicated set of projects beneath a named Black
//! Duck project group, however deeply its sub-groups are nested, and uses the
//! resulting project names to restrict CSV scan exports.
//!
//! # Architecture Overview
//!
//! ```text
//! group name ─▶ Session ─▶ group search ─▶ HierarchyResolver ─▶ ProjectSet
//!                                              │                    │
//!                                         PageCursor          to_name_set
//!                                                                   │
//!                                     Dataset (zip of CSV) ─▶ apply_filter ─▶ CSV files
//! ```
//!
//! Every component that talks to the server does so through the
//! [`hub::HubTransport`] trait, implemented by [`hub::Session`] for real
//! servers and by `test_utils::MockHub` in tests.
//!
//! # Core Modules
//!
//! - [`hub`] - authenticated session, wire models and pagination
//! - [`resolver`] - depth-first group expansion, [`resolver::ProjectSet`],
//!   error policy and cancellation
//! - [`filter`] - project name sets and record batch filtering
//! - [`dataset`] - zip/CSV loading and CSV writing
//!
//! ## Supporting Modules
//!
//! - [`cli`] - `bdmetrics` command tree and exit codes
//! - [`config`] - config file, `BD_*` environment overrides, credentials
//! - [`core`] - [`core::HubError`] and user-facing error reporting
//! - [`constants`] - protocol limits, endpoint paths and variable names
//! - [`utils`] - progress spinners and output naming
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bdmetrics::config::{Credentials, HubConfig};
//! use bdmetrics::filter::to_name_set;
//! use bdmetrics::resolver::resolve_group;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = HubConfig::new("https://blackduck.example.com", Credentials::token("..."));
//! let report = resolve_group(&config, "Platform", None).await?;
//!
//! println!("{}", report.summary);
//! let names = to_name_set(report.projects());
//! # Ok(())
//! # }
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! export BD_URL=https://blackduck.example.com
//! export BD_API_TOKEN=...
//!
//! bdmetrics resolve "Platform"
//! bdmetrics filter heatmap.zip --project-group "Platform" -o reports/
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod dataset;
pub mod filter;
pub mod hub;
pub mod resolver;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
