//! bdmetrics command-line entry point.
//!
//! Parses arguments, sets up logging, wires Ctrl-C to cancellation and maps
//! the command's outcome or error to a process exit code.

use bdmetrics::cli::{self, CliConfig, exit_codes};
use bdmetrics::core::user_friendly_error;
use bdmetrics::resolver::CancelToken;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the stderr subscriber. `RUST_LOG` wins over the verbosity flags.
fn init_logging(config: &CliConfig) {
    let default_directive = match config.log_level {
        Some(level) => format!("bdmetrics={}", level.as_str().to_lowercase()),
        None => "bdmetrics=error".to_string(),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

#[tokio::main]
async fn main() {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // clap would exit with 2, which is reserved for a missing group
            let _ = e.print();
            let code = if e.use_stderr() {
                exit_codes::EXIT_USAGE
            } else {
                exit_codes::EXIT_SUCCESS
            };
            std::process::exit(code);
        }
    };

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let config = cli.build_config();
    init_logging(&config);

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling...");
                cancel.cancel();
            }
        });
    }

    let code = match cli.execute_with_config(config, cancel).await {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            let code = exit_codes::for_error(&e);
            user_friendly_error(e).display();
            code
        }
    };
    std::process::exit(code);
}
