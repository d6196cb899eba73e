//! File logging for scorecast
//!
//! The overlay owns stdout, so every event goes to a rolling file in the XDG
//! state directory: `$XDG_STATE_HOME/scorecast/scorecast.<YYYY-MM-DD>.log`.
//! The date is the UTC day the file was opened; older files are pruned down
//! to `logging.max_files`.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};

const LOG_PREFIX: &str = "scorecast";
const LOG_SUFFIX: &str = "log";

/// Keeps the background writer alive; pending lines are flushed on drop
#[must_use = "logging stops when the guard is dropped"]
pub struct LoggingGuard {
    _worker: WorkerGuard,
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `logging.level`. A second call leaves the first
/// subscriber in place.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let dir = Config::log_dir();
    std::fs::create_dir_all(&dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix(LOG_SUFFIX)
        .max_log_files(config.max_files)
        .build(&dir)
        .map_err(|e| Error::Config(format!("cannot open log directory: {}", e)))?;
    let (writer, worker) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init();

    match installed {
        Ok(()) => tracing::info!(
            file = %current_log_file().display(),
            level = %config.level,
            "Logging to file"
        ),
        Err(e) => tracing::debug!(error = %e, "Subscriber already installed"),
    }

    Ok(LoggingGuard { _worker: worker })
}

/// Path of the log file written on `day`
pub fn log_file_for(dir: &Path, day: NaiveDate) -> PathBuf {
    dir.join(format!("{}.{}.{}", LOG_PREFIX, day.format("%Y-%m-%d"), LOG_SUFFIX))
}

/// Path of today's log file
pub fn current_log_file() -> PathBuf {
    log_file_for(&Config::log_dir(), Utc::now().date_naive())
}
