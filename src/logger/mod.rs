//! Structured logging for the relay
//!
//! Colored console logging with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-module debug control via --debug-<module> flags
//! - Automatic filtering from command-line arguments
//!
//! ## Usage
//!
//! ```rust
//! use fleet_relay::logger::{self, LogTag};
//!
//! logger::info(LogTag::System, "relay starting");
//! logger::warning(LogTag::Auth, "subscriber rejected: expired token");
//! logger::debug(LogTag::Relay, "frame dispatched"); // Only with --debug-relay
//! ```

mod format;
mod levels;
mod tags;

pub use levels::LogLevel;
pub use tags::LogTag;

use crate::arguments;

/// Initialize the logger system
///
/// Call once at application startup, before any logging occurs. Forces the
/// command-line argument singleton to populate so filtering decisions are
/// stable for the life of the process.
pub fn init() {
    let _ = arguments::get_cmd_args();
}

/// Check if a log message should be displayed
///
/// Filtering rules:
/// 1. Errors are always shown
/// 2. Debug level requires --debug-<module> for that tag, --debug-all, or --verbose
/// 3. Verbose level requires --verbose
/// 4. Info is suppressed by --quiet
fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    if level == LogLevel::Error {
        return true;
    }

    match level {
        LogLevel::Debug => {
            arguments::is_verbose_enabled()
                || arguments::is_debug_all_enabled()
                || arguments::is_debug_enabled(&tag.to_debug_key())
        }
        LogLevel::Verbose => arguments::is_verbose_enabled(),
        LogLevel::Info => !arguments::is_quiet_enabled(),
        _ => true,
    }
}

fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }
    format::format_and_log(tag, level.as_str(), message);
}

/// Log at ERROR level (always shown, critical issues)
pub fn error(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (important issues)
pub fn warning(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level (detailed diagnostics, gated by --debug-<module>)
pub fn debug(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (very detailed tracing, gated by --verbose)
pub fn verbose(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Verbose, message);
}
