//! Logging and tracing configuration
//!
//! Console logging for the CLI, with an optional log file in the platform
//! data directory for runs that should leave a trace behind.

use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::paths;

/// Name of the engine log file inside the log directory
const LOG_FILE_NAME: &str = "engine.log";

fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("scenario_engine=debug,info")
        } else {
            EnvFilter::new("scenario_engine=info,warn")
        }
    })
}

/// Initialize tracing for the CLI (stderr logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate (DEBUG with `verbose`), WARN for dependencies.
pub fn init_cli(verbose: bool) {
    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Initialize tracing with both stderr and a log file
///
/// The file lives at `<data dir>/logs/engine.log` and is appended to.
/// Falls back to stderr only when the file cannot be opened.
pub fn init_with_file(verbose: bool) -> Option<PathBuf> {
    let log_file = paths::log_dir().and_then(|log_dir| {
        std::fs::create_dir_all(&log_dir).ok()?;
        let log_file = log_dir.join(LOG_FILE_NAME);
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
        {
            Ok(file) => Some((log_file, file)),
            Err(e) => {
                eprintln!("Warning: Could not open log file: {}", e);
                None
            }
        }
    });

    match log_file {
        Some((path, file)) => {
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true);

            let stderr_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact();

            tracing_subscriber::registry()
                .with(default_filter(verbose))
                .with(file_layer)
                .with(stderr_layer)
                .init();

            Some(path)
        }
        None => {
            init_cli(verbose);
            None
        }
    }
}
