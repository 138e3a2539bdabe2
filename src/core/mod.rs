//! Core types shared by every bdmetrics module.
//!
//! Currently this is the error taxonomy and the user-facing error reporting
//! built on top of it. See [`error`] for details.

pub mod error;

pub use error::{ErrorContext, HubError, user_friendly_error};
