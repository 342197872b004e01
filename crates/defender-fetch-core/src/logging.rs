//! Logging setup
//!
//! Events go to standard output and, for runs, to `defender.log` in the
//! output directory. The file is appended to and never rotated.

use std::io;
use std::path::Path;

use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{Error, Result};

/// Log file written next to the alert files
pub const LOG_FILE_NAME: &str = "defender.log";

/// Keeps the file writer flushing until dropped
#[must_use = "dropping the guard stops writes to the log file"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `level`. With `log_dir` set, every event
/// is also appended to `{log_dir}/defender.log`.
pub fn init(level: &str, log_dir: Option<&Path>) -> Result<LogGuard> {
    let (subscriber, guard) = subscriber(level, log_dir)?;

    subscriber
        .try_init()
        .map_err(|e| Error::internal(format!("failed to install logger: {e}")))?;

    Ok(LogGuard { _file: guard })
}

fn subscriber(
    level: &str,
    log_dir: Option<&Path>,
) -> Result<(impl Subscriber + Send + Sync + 'static, Option<WorkerGuard>)> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| Error::config(format!("invalid log level '{level}': {e}")))?;

    let stdout_layer = fmt::layer().with_target(false);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix("defender")
                .filename_suffix("log")
                .build(dir)
                .map_err(|e| {
                    Error::file_write(
                        dir.join(LOG_FILE_NAME),
                        io::Error::new(io::ErrorKind::Other, e.to_string()),
                    )
                })?;
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer);

    Ok((subscriber, guard))
}
