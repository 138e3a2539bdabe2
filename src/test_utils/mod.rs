//! Test utilities for bdmetrics
//!
//! This module provides an in-memory hub that implements
//! [`HubTransport`](crate::hub::HubTransport), JSON builders for hub
//! resources, and one-time logging setup for tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use bdmetrics::resolver::{HierarchyResolver, ResolveOptions};
//! use bdmetrics::test_utils::{MockHub, group_ref, project_ref};
//!
//! # async fn example() -> Result<(), bdmetrics::core::HubError> {
//! let hub = MockHub::new();
//! hub.root_group("root", "Platform");
//! hub.group("root", vec![group_ref("a"), project_ref("p1")]);
//! hub.group("a", vec![project_ref("p2")]);
//! hub.project("p1", "billing");
//! hub.project("p2", "ledger");
//!
//! let report = HierarchyResolver::new(&hub, ResolveOptions::default())
//!     .resolve("Platform")
//!     .await?;
//! assert_eq!(report.projects().total_count(), 2);
//! # Ok(())
//! # }
//! ```

mod mock_hub;

pub use mock_hub::{
    MOCK_BASE, MockHub, RecordedRequest, group_ref, group_url, named_group_ref, project_doc,
    project_ref, project_url,
};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, tests run without a subscriber.
///
/// ```bash
/// RUST_LOG=bdmetrics=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
