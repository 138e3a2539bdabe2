//! Global constants used throughout the bdmetrics codebase.
//!
//! This module contains timeouts, paging limits and well-known API names that
//! are used across multiple modules. Defining them centrally keeps the magic
//! numbers of the hub protocol discoverable.

/// Maximum number of items the hub returns for a single listing request.
///
/// Listing endpoints reject or silently clamp larger `limit` values, so
/// every page request is capped at this size.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Maximum group nesting depth followed before a subtree is abandoned.
///
/// Real group trees are a handful of levels deep; anything beyond this is
/// treated as malformed server data.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Media type requested for group listings and project detail documents.
pub const HUB_MEDIA_TYPE: &str = "application/vnd.blackducksoftware.project-detail-5+json";

/// Path of the group search endpoint, relative to the base URL.
pub const PROJECT_GROUPS_PATH: &str = "/api/project-groups";

/// Path of the API token exchange endpoint.
pub const TOKEN_AUTH_PATH: &str = "/api/tokens/authenticate";

/// Path of the username/password login endpoint.
pub const LOGIN_PATH: &str = "/j_spring_security_check";

/// Cookie carrying the bearer token after a username/password login.
pub const BEARER_COOKIE: &str = "AUTHORIZATION_BEARER";

/// Header echoed back on every request after a username/password login.
pub const CSRF_HEADER: &str = "X-CSRF-TOKEN";

/// Column that identifies the owning project in scan record batches.
pub const PROJECT_NAME_COLUMN: &str = "projectName";

/// Environment variables read by [`crate::config::HubConfig::with_env_overrides`].
pub mod env {
    /// Hub base URL.
    pub const BD_URL: &str = "BD_URL";
    /// API token (preferred credential).
    pub const BD_API_TOKEN: &str = "BD_API_TOKEN";
    /// Username for password authentication.
    pub const BD_USERNAME: &str = "BD_USERNAME";
    /// Password for password authentication.
    pub const BD_PASSWORD: &str = "BD_PASSWORD";
    /// Set to `1`/`true` to skip TLS certificate verification.
    pub const BD_INSECURE: &str = "BD_INSECURE";
    /// Request timeout in seconds.
    pub const BD_TIMEOUT: &str = "BD_TIMEOUT";
    /// Path of the configuration file.
    pub const BDMETRICS_CONFIG: &str = "BDMETRICS_CONFIG";
    /// Set to any value to hide progress spinners.
    pub const BDMETRICS_NO_PROGRESS: &str = "BDMETRICS_NO_PROGRESS";
}
