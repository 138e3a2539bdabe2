//! Integration test suite for bdmetrics
//!
//! End-to-end tests of the `bdmetrics` binary and of the resolve → filter
//! pipeline against the in-memory hub. No test needs a real Black Duck
//! server.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli_errors**: exit codes and messages for configuration, credential,
//!   transport and input errors
//! - **config_command**: `bdmetrics config` and config file layering
//! - **group_filtering**: resolving nested groups and filtering zip exports

#[path = "../common/mod.rs"]
mod common;

mod cli_errors;
mod config_command;
mod group_filtering;
