//! Hub API client: session, transport seam, wire models and pagination.
//!
//! # Architecture
//!
//! ```text
//! Session ──implements──▶ HubTransport ◀──uses── PageCursor ◀──uses── HierarchyResolver
//!    │                         ▲
//!    └─ reqwest::Client        └─ MockHub (tests)
//! ```
//!
//! Everything above the [`HubTransport`] trait is written against the trait,
//! so the traversal and pagination logic runs unchanged against the
//! in-memory hub from [`crate::test_utils`].
//!
//! # Remote API
//!
//! - `GET {base}/api/project-groups?q=name:<group>` - group search
//! - `GET <group>/children?offset=&limit=` - children listing
//! - `GET <project>` - project detail document
//!
//! All listings share the `{totalCount, items}` envelope modeled by [`Page`].

use serde_json::Value;
use std::future::Future;

use crate::core::HubError;

pub mod models;
pub mod pagination;
pub mod session;

pub use models::{GroupNode, Link, Meta, Page, ProjectDetail};
pub use pagination::PageCursor;
pub use session::Session;

/// Request capability shared by everything that talks to the hub.
///
/// Implementations perform one GET and decode the body as JSON, mapping
/// failures onto the [`HubError`] taxonomy:
/// - no response → [`HubError::Transport`]
/// - HTTP 401 → [`HubError::Auth`]
/// - other non-success status → [`HubError::Api`]
/// - undecodable body → [`HubError::Parse`]
pub trait HubTransport: Send + Sync {
    /// Base URL without a trailing separator.
    fn base_url(&self) -> &str;

    /// GET `url` with `query` parameters and decode the JSON body.
    fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> impl Future<Output = Result<Value, HubError>> + Send;
}
