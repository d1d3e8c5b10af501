//! Logging setup for the CLI
//!
//! Diagnostics go to stderr so that stdout stays machine-readable. A daily
//! rolling file log is added when enabled in the configuration.

use crate::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Log file name prefix
pub const LOG_FILE_PREFIX: &str = "sw16-setup.log";

/// Filter directive used when `RUST_LOG` is not set
pub fn default_directive(config: &LoggingConfig, verbose: bool, quiet: bool) -> String {
    if quiet {
        "error".to_string()
    } else if verbose {
        "debug".to_string()
    } else {
        config.level.clone()
    }
}

/// Install the global subscriber
///
/// The returned guard flushes the file log on drop; keep it alive for the
/// lifetime of the program.
pub fn init_logging(config: &LoggingConfig, verbose: bool, quiet: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config, verbose, quiet)));

    let mut guard = None;
    let file_layer = match config.directory.as_ref().filter(|_| config.file) {
        Some(dir) => match RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .build(dir)
        {
            Ok(appender) => {
                let (writer, worker) = tracing_appender::non_blocking(appender);
                guard = Some(worker);
                Some(fmt::layer().with_ansi(false).with_writer(writer))
            }
            Err(e) => {
                eprintln!("warning: file logging disabled ({}): {}", dir.display(), e);
                None
            }
        },
        None => None,
    };

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init();
    if let Err(e) = result {
        eprintln!("warning: logging already initialised: {}", e);
    }

    guard
}
