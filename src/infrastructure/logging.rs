//! Logging configuration
//!
//! Initializes tracing for the application.

/// Initializes logging with the specified level
///
/// `RUST_LOG` takes precedence over `level`. Calling this more than once
/// keeps the first subscriber.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .try_init();
}

/// Detect logging level matching a subscriber level
///
/// Detect understands `TRACE`, `DEBUG`, `INFO`, `WARN` and `ERROR`. Any
/// other filter expression falls back to `INFO`.
#[must_use]
pub fn detect_log_level(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "TRACE",
        "debug" => "DEBUG",
        "warn" | "warning" => "WARN",
        "error" => "ERROR",
        _ => "INFO",
    }
}
