//! Error handling for bdmetrics
//!
//! This module provides the error taxonomy of the hub client and the
//! user-friendly error reporting used by the CLI. It is built around two types:
//! - [`HubError`] - strongly-typed failures of configuration, authentication,
//!   transport, API responses and traversal
//! - [`ErrorContext`] - wrapper that adds details and an actionable suggestion
//!
//! # Propagation
//!
//! [`HubError::Auth`] and [`HubError::Cancelled`] always abort a resolution.
//! Transport, API and parse failures met while walking a group tree are either
//! recorded and skipped or escalated to [`HubError::Traversal`], depending on
//! the caller's [`ErrorPolicy`](crate::resolver::ErrorPolicy).
//!
//! # Examples
//!
//! ```rust,no_run
//! use bdmetrics::core::{HubError, user_friendly_error};
//!
//! let err = HubError::Auth {
//!     reason: "missing credentials".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(err));
//! ctx.display(); // colored error with a suggestion
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for hub operations.
///
/// Every variant carries owned strings rather than the underlying library
/// error so the type stays `Clone` and can be recorded in traversal reports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    /// Configuration is incomplete or invalid (e.g. no base URL).
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Credentials are missing, rejected by the server, or the session was closed.
    #[error("Authentication failed: {reason}")]
    Auth {
        /// Why authentication failed
        reason: String,
    },

    /// The request never produced an HTTP response (DNS, connect, TLS, timeout).
    #[error("Request to {url} failed: {message}")]
    Transport {
        /// URL of the failed request
        url: String,
        /// Underlying transport error message
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("Hub returned HTTP {status} for {url}")]
    Api {
        /// HTTP status code
        status: u16,
        /// URL of the failed request
        url: String,
    },

    /// A response body could not be decoded into the expected shape.
    #[error("Unexpected response from {url}: {message}")]
    Parse {
        /// URL whose response failed to decode
        url: String,
        /// Decoder error message
        message: String,
    },

    /// A subtree or project failed while the strict error policy was active.
    #[error("Failed to resolve {link}")]
    Traversal {
        /// Link of the group or project that failed
        link: String,
        /// The failure that aborted the walk
        #[source]
        source: Box<HubError>,
    },

    /// A group sits deeper than the configured nesting limit.
    #[error("Group {link} exceeds the maximum nesting depth of {max_depth}")]
    DepthExceeded {
        /// Link of the group that was not expanded
        link: String,
        /// The configured limit
        max_depth: usize,
    },

    /// The caller cancelled the resolution.
    #[error("Resolution cancelled")]
    Cancelled,

    /// A record archive could not be read or written.
    #[error("Dataset error in {path}: {message}")]
    Dataset {
        /// Archive or directory path
        path: String,
        /// What went wrong
        message: String,
    },

    /// Anything else, typically a wrapped `anyhow` chain.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl HubError {
    /// Errors that abort a resolution regardless of the error policy.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Auth { .. } | Self::Cancelled | Self::Config { .. } => true,
            Self::Traversal { source, .. } => source.is_fatal(),
            _ => false,
        }
    }

    /// HTTP status carried by this error, looking through traversal wrappers.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Traversal { source, .. } => source.status(),
            _ => None,
        }
    }

    /// The innermost error, with traversal wrappers removed.
    #[must_use]
    pub fn root(&self) -> &HubError {
        match self {
            Self::Traversal { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Error wrapper with user-facing details and a suggestion.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: HubError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with no suggestion or details.
    #[must_use]
    pub const fn new(error: HubError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr: error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with actionable suggestions.
///
/// Recognizes [`HubError`] anywhere in the chain, I/O errors, TOML parse
/// errors and zip archive errors. Anything else is reported with its full
/// cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(hub_error) = error.chain().find_map(|e| e.downcast_ref::<HubError>()) {
        return create_error_context(hub_error.clone());
    }

    if error.chain().any(|e| e.is::<toml::de::Error>()) {
        return ErrorContext::new(HubError::Config {
            message: format!("{error:#}"),
        })
        .with_suggestion("Check the TOML syntax of your bdmetrics config file")
        .with_details("The config file is read from --config, BDMETRICS_CONFIG or ~/.bdmetrics/config.toml");
    }

    if error.chain().any(|e| e.is::<zip::result::ZipError>()) {
        return ErrorContext::new(HubError::Other {
            message: format!("{error:#}"),
        })
        .with_suggestion("Make sure the input is a zip archive exported from Black Duck");
    }

    if let Some(io_error) = error.chain().find_map(|e| e.downcast_ref::<std::io::Error>()) {
        if io_error.kind() == std::io::ErrorKind::NotFound {
            return ErrorContext::new(HubError::Other {
                message: error.to_string(),
            })
            .with_suggestion("Check that the file or directory exists and the path is correct");
        }
        if io_error.kind() == std::io::ErrorKind::PermissionDenied {
            return ErrorContext::new(HubError::Other {
                message: error.to_string(),
            })
            .with_suggestion("Check the permissions of the input file and output directory");
        }
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(HubError::Other {
        message,
    })
}

fn create_error_context(error: HubError) -> ErrorContext {
    match error.root().clone() {
        HubError::Config { .. } => ErrorContext::new(error)
            .with_suggestion("Pass --bd-url or set BD_URL to the Black Duck server address")
            .with_details("The server URL may also be set as base_url in the bdmetrics config file"),
        HubError::Auth { .. } => ErrorContext::new(error)
            .with_suggestion(
                "Provide an API token with --bd-token or BD_API_TOKEN (or BD_USERNAME and BD_PASSWORD)",
            )
            .with_details("API tokens take priority over username/password credentials"),
        HubError::Transport { .. } => ErrorContext::new(error)
            .with_suggestion(
                "Check the server URL and your network connection; use --insecure for self-signed certificates",
            )
            .with_details("The request timed out or never reached the server"),
        HubError::Api { status, .. } => {
            let details = match status {
                403 => "The credentials are valid but lack permission for project groups",
                404 => "The endpoint or group no longer exists on the server",
                s if s >= 500 => "The server reported an internal error",
                _ => "The server rejected the request",
            };
            ErrorContext::new(error)
                .with_details(details)
                .with_suggestion("Re-run with --verbose to see which request failed")
        }
        HubError::Parse { .. } => ErrorContext::new(error)
            .with_suggestion("Check that --bd-url points at a Black Duck server")
            .with_details("The response did not have the expected {totalCount, items} shape"),
        HubError::DepthExceeded { .. } => ErrorContext::new(error)
            .with_suggestion("Raise --max-depth if the group tree really is this deep")
            .with_details("Very deep or self-referencing group trees usually indicate inconsistent server data"),
        HubError::Cancelled => ErrorContext::new(error),
        HubError::Dataset { .. } => ErrorContext::new(error)
            .with_suggestion("Make sure the input is a zip archive of CSV files"),
        HubError::Traversal { .. } | HubError::Other { .. } => ErrorContext::new(error),
    }
}
