//! Logging Infrastructure
//!
//! Structured logging to stderr, or to a daily-rolling file when a log
//! directory is configured. `RUST_LOG` takes precedence over the level passed
//! in.

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Initialize the logger
pub fn init_logger() {
    init_logger_with_file(None, false, None);
}

/// Initialize the logger with optional JSON format and file output
pub fn init_logger_with_file(log_level: Option<&str>, json: bool, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    let file_appender = log_dir
        .map(Path::new)
        .filter(|dir| dir.is_dir())
        .map(|dir| tracing_appender::rolling::daily(dir, "kasse-print"));

    match (file_appender, json) {
        (Some(writer), true) => subscriber.json().with_writer(writer).init(),
        (Some(writer), false) => subscriber.with_ansi(false).with_writer(writer).init(),
        (None, true) => subscriber.json().init(),
        (None, false) => subscriber.init(),
    }
}
