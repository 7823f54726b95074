//! slircbot - a small scriptable IRC bot.
//!
//! One [`Connection`](network::Connection) feeds parsed
//! [`Event`](message::Event)s to a [`PluginRegistry`](plugin::PluginRegistry)
//! of rhai scripts; whatever they queue goes back out through a
//! flood-controlled writer.

pub mod bot;
pub mod config;
pub mod error;
pub mod message;
pub mod network;
pub mod plugin;
pub mod telemetry;
pub mod util;

pub use config::Config;
pub use message::{Event, Message};
pub use network::Connection;
pub use plugin::PluginRegistry;
