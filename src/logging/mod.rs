//! Console and log-file tracing setup.
//!
//! Two sinks are installed:
//! - stdout, at the level chosen by `RUST_LOG`, `-q`/`-v`, or the config file
//! - `logs/download.log`, always at debug, without ANSI colors, rolled monthly
//!   by [`MonthlyRollingFile`]
//!
//! Messages emitted while mirroring a platform carry the `mirror{platform=..}`
//! span, which serves as the message tag.

mod rolling;

pub use rolling::{MonthlyRollingFile, RollingWriter, YearMonth};

use std::io::IsTerminal;
use std::path::Path;

use thiserror::Error;
use tracing::warn;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Timestamp layout shared by both sinks.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// File sink filter. HTTP internals stay at info so the file is not flooded
/// with connection-pool chatter.
const FILE_FILTER: &str = "debug,hyper=info,hyper_util=info,h2=info,rustls=info,reqwest=info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("a global tracing subscriber is already installed: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Maps the CLI/config verbosity to a console filter directive.
///
/// `quiet` wins over any `-v` count.
#[must_use]
pub fn console_level(quiet: bool, verbose: u8) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides `default_level` for the console. When `log_file` is
/// `None` or cannot be opened, only the console sink is installed; the open
/// failure is reported as a warning once the subscriber is live.
///
/// # Errors
///
/// Returns [`LoggingError::AlreadyInitialized`] if a subscriber was already set.
pub fn init_logging(default_level: &str, log_file: Option<&Path>) -> Result<(), LoggingError> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let console = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(std::io::stdout().is_terminal())
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_filter(console_filter);

    let (file_writer, open_error) = match log_file.map(MonthlyRollingFile::open) {
        Some(Ok(writer)) => (Some(writer), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };
    let file = file_writer.map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
            .with_filter(EnvFilter::new(FILE_FILTER))
    });

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()?;

    if let (Some(path), Some(e)) = (log_file, open_error) {
        warn!(
            path = %path.display(),
            error = %e,
            "cannot open log file, logging to the console only"
        );
    }
    Ok(())
}
