//! Logging system.
//!
//! Warnings and errors always go to stderr. With debug enabled, everything
//! down to DEBUG is also written to a daily-rotated file in the log directory.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::Path;
use time::macros::format_description;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Prefix of every log file name.
const LOG_FILE_PREFIX: &str = "filter-pipes";

/// Level at which events reach stderr regardless of `debug`.
const CONSOLE_LEVEL: LevelFilter = LevelFilter::WARN;

/// Initialize the logging system.
pub fn init(config: &Config, debug: bool) -> Result<()> {
    // File output only in debug mode
    let file_layer = if debug {
        if !config.log_path.exists() {
            fs::create_dir_all(&config.log_path)?;
        }
        cleanup_old_logs(&config.log_path)?;

        let file_appender =
            RollingFileAppender::new(Rotation::DAILY, &config.log_path, LOG_FILE_PREFIX);

        // Local timezone when it can be determined, UTC otherwise
        let time_format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        let local_offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
        let timer = OffsetTime::new(local_offset, time_format);

        Some(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(timer)
                .with_filter(
                    EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
                ),
        )
    } else {
        None
    };

    // The console stands in for an editor's console panel: terse, no timestamps
    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .with_filter(CONSOLE_LEVEL);

    let subscriber = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(())
}

/// Remove filter-pipes log files older than two days.
pub fn cleanup_old_logs(log_path: &Path) -> Result<()> {
    use std::time::{Duration, SystemTime};

    let two_days = Duration::from_secs(2 * 24 * 60 * 60);
    let cutoff = SystemTime::now() - two_days;

    if !log_path.exists() {
        return Ok(());
    }

    for entry in fs::read_dir(log_path)? {
        let entry = entry?;
        let path = entry.path();

        // Only process log files
        if !path.is_file() {
            continue;
        }

        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        // Leave other programs' files alone
        if !filename.starts_with(LOG_FILE_PREFIX) {
            continue;
        }

        let expired = entry
            .metadata()
            .and_then(|m| m.modified())
            .is_ok_and(|modified| modified < cutoff);
        if expired {
            let _ = fs::remove_file(&path);
        }
    }

    Ok(())
}
