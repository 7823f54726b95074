//! Integration test common infrastructure.
//!
//! Provides a scripted in-memory server for the bot to talk to, and
//! temporary plugin directories.

#![allow(dead_code)]

pub mod plugins;
pub mod server;

#[allow(unused_imports)]
pub use plugins::PluginDir;
#[allow(unused_imports)]
pub use server::TestServer;

use slircbot::Event;
use slircbot::config::Config;

/// Parse a raw line the way the inbound worker would.
pub fn event(line: &str, config: &Config) -> Event {
    Event::parse(line.to_string(), config)
}
