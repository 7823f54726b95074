//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use std::path::PathBuf;

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_host() -> String {
    "irc.libera.chat".to_string()
}

pub fn default_port() -> u16 {
    6667
}

// =============================================================================
// Identity Defaults
// =============================================================================

/// Nick and username share a process-unique default.
pub fn default_nick() -> String {
    format!("slircbot-{:06}", std::process::id())
}

pub fn default_user() -> String {
    default_nick()
}

pub fn default_name() -> String {
    format!("SlircBot {:06}", std::process::id())
}

// =============================================================================
// Plugin Defaults
// =============================================================================

pub fn default_plugins() -> PathBuf {
    PathBuf::from("./plugins")
}

pub fn default_command_prefix() -> String {
    ".".to_string()
}
