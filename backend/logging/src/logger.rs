//! Structured Logger
//!
//! Console output for operators plus NDJSON records in a daily rolling file
//! under `LOG_DIR`. `RUST_LOG` overrides the configured level.

use std::path::Path;

use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "formlens";
const LOG_FILE_SUFFIX: &str = "log";

/// Opens `<log_dir>/formlens.YYYY-MM-DD.log`, creating the directory if needed.
fn daily_file(log_dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(log_dir)
}

/// Install the global subscriber.
///
/// Fails when the log directory cannot be created or opened. Returns `false`
/// if a subscriber was already installed.
pub fn init_logger<P: AsRef<Path>>(log_dir: P, level: &str) -> Result<bool, InitError> {
    let file_appender = daily_file(log_dir.as_ref())?;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_writer(file_appender)
        .with_ansi(false);

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true);

    Ok(tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok())
}
