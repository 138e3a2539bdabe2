//! Progress spinners for long-running hub operations.
//!
//! Spinners draw on stderr so they never mix with command output, and are
//! hidden when:
//! - `--no-progress` or `--quiet` is passed
//! - the `BDMETRICS_NO_PROGRESS` environment variable is set
//! - stderr is not a terminal
//!
//! # Examples
//!
//! ```rust,no_run
//! use bdmetrics::utils::progress::ProgressBar;
//!
//! let spinner = ProgressBar::new_spinner(true);
//! spinner.set_message("Resolving project group Platform...");
//! // resolve_group(...).await?;
//! spinner.finish_and_clear();
//! ```

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::io::IsTerminal;
use std::time::Duration;

use crate::constants::env::BDMETRICS_NO_PROGRESS;

/// Whether spinners are suppressed by the environment.
fn is_progress_disabled() -> bool {
    std::env::var_os(BDMETRICS_NO_PROGRESS).is_some() || !std::io::stderr().is_terminal()
}

fn spinner_style() -> IndicatifStyle {
    IndicatifStyle::default_spinner()
        .template("{spinner:.cyan} {msg} {elapsed:.dim}")
        .unwrap_or_else(|_| IndicatifStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
}

/// An indeterminate progress indicator.
///
/// Cloning shares the same spinner. A hidden spinner accepts every call and
/// draws nothing.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Create a ticking spinner, or a hidden one when `enabled` is false or
    /// progress output is disabled.
    pub fn new_spinner(enabled: bool) -> Self {
        if !enabled || is_progress_disabled() {
            return Self::hidden();
        }

        let bar = IndicatifBar::new_spinner();
        bar.set_style(spinner_style());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self {
            inner: bar,
        }
    }

    /// A spinner that never draws.
    pub fn hidden() -> Self {
        Self {
            inner: IndicatifBar::hidden(),
        }
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    /// Stop ticking and leave `msg` on screen.
    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.inner.finish_with_message(msg.into());
    }

    /// Stop ticking and erase the spinner line.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }

    pub fn is_hidden(&self) -> bool {
        self.inner.is_hidden()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_spinner_is_hidden() {
        let spinner = ProgressBar::new_spinner(false);
        assert!(spinner.is_hidden());

        spinner.set_message("working");
        spinner.finish_with_message("done");
        spinner.finish_and_clear();
    }

    #[test]
    fn test_hidden_clone_shares_state() {
        let spinner = ProgressBar::hidden();
        let clone = spinner.clone();
        clone.set_message("still hidden");
        assert!(spinner.is_hidden());
    }
}
