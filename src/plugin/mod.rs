//! Script plugins.
//!
//! Plugins are rhai scripts under the configured plugin directory. Each one
//! registers pattern actions at load time; the registry offers every parsed
//! message to each plugin in discovery order.

pub mod action;
pub mod effect;
mod host;
mod loader;
mod registry;

pub use action::{Action, ActionKind, EventFilter, Handler, OWNER_DENIED};
pub use effect::{Flow, Outbox};
pub use host::{ActionSummary, Catalog, PluginSummary};
pub use loader::{EXTENSION, Plugin};
pub use registry::{Dispatch, PluginRegistry};
