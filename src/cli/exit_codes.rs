//! # Exit Codes
//!
//! Process exit codes of the `bdmetrics` binary. Scripts can tell "the group
//! does not exist" apart from "the group exists but filtered everything out"
//! and from hub failures.

use crate::core::HubError;

/// Successful execution
pub const EXIT_SUCCESS: i32 = 0;

/// General error (unspecified)
pub const EXIT_ERROR: i32 = 1;

/// No project group matched the requested name
pub const EXIT_NO_MATCHING_GROUP: i32 = 2;

/// The group matched but contains no projects
pub const EXIT_NO_PROJECTS: i32 = 3;

/// No rows remained after filtering by project group
pub const EXIT_NO_DATA: i32 = 4;

/// Missing or rejected credentials
pub const EXIT_AUTH_ERROR: i32 = 5;

/// The hub could not be reached (connection failed, timeout, TLS)
pub const EXIT_TRANSPORT_ERROR: i32 = 6;

/// Invalid command-line usage (sysexits `EX_USAGE`)
pub const EXIT_USAGE: i32 = 64;

/// Interrupted with Ctrl-C
pub const EXIT_CANCELLED: i32 = 130;

/// Exit code for a failed command, based on the first [`HubError`] in its chain.
pub fn for_error(error: &anyhow::Error) -> i32 {
    let Some(hub_error) = error.chain().find_map(|e| e.downcast_ref::<HubError>()) else {
        return EXIT_ERROR;
    };

    match hub_error.root() {
        HubError::Auth { .. } => EXIT_AUTH_ERROR,
        HubError::Transport { .. } => EXIT_TRANSPORT_ERROR,
        HubError::Cancelled => EXIT_CANCELLED,
        _ => EXIT_ERROR,
    }
}
