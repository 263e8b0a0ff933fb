use log::{info, log_enabled, Level, LevelFilter};

/// Initializes the logger with the `env_logger` crate.
///
/// The level comes from `RUST_LOG`; without it only warnings and errors are shown.
pub fn init_logger() {
    init_logger_with_default(LevelFilter::Warn);
}

/// Initializes `env_logger` with `default` as the level when `RUST_LOG` is unset.
///
/// Calling it more than once is harmless; later calls are ignored.
pub fn init_logger_with_default(default: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(default)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}

/// Logs an informational message.
pub fn log_info(message: &str) {
    if log_enabled!(Level::Info) {
        info!("{message}");
    }
}
