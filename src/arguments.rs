/// Centralized argument handling for the relay
///
/// Consolidates command-line argument parsing and debug flag checking so the
/// logger and entrypoint read flags from one place.
///
/// Features:
/// - Centralized CMD_ARGS storage with thread-safe access
/// - Debug flag checking functions per module (--debug-<module>)
/// - Unified argument parsing utilities
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
/// Thread-safe singleton that stores arguments for access throughout the application
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Sets the global command-line arguments
/// Used by tests to override the default env::args() collection
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
/// Returns a vector clone to avoid holding the mutex lock
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => {
            // Fallback to env::args if mutex is poisoned
            env::args().collect()
        }
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Gets the value of a command-line argument that follows a flag
/// Returns None if the flag is not found or has no value
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    for (i, arg) in args.iter().enumerate() {
        if arg == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

/// Path to the TOML configuration file (--config <path>)
pub fn get_config_path() -> Option<String> {
    get_arg_value("--config")
}

/// Listener port override (--port <port>)
pub fn get_port_override() -> Option<String> {
    get_arg_value("--port")
}

// =============================================================================
// DEBUG FLAG CHECKING FUNCTIONS
// These functions check for specific debug flags in the command-line arguments
// =============================================================================

/// Suppress Info-level output
pub fn is_quiet_enabled() -> bool {
    has_arg("--quiet")
}

/// Show Verbose-level output
pub fn is_verbose_enabled() -> bool {
    has_arg("--verbose")
}

/// Enable debug output for every module
pub fn is_debug_all_enabled() -> bool {
    has_arg("--debug-all")
}

/// Per-module debug mode (--debug-<module>)
pub fn is_debug_enabled(module: &str) -> bool {
    has_arg(&format!("--debug-{}", module))
}

/// Relay dispatch debug mode
pub fn is_debug_relay_enabled() -> bool {
    is_debug_enabled("relay")
}

/// Token gate debug mode
pub fn is_debug_auth_enabled() -> bool {
    is_debug_enabled("auth")
}

/// Frame decoder debug mode
pub fn is_debug_decoder_enabled() -> bool {
    is_debug_enabled("decoder")
}
