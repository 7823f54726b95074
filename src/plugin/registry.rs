//! Plugin discovery, lifecycle and dispatch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::effect::{Flow, Outbox};
use super::host::Catalog;
use super::loader::{EXTENSION, Plugin};
use crate::config::Config;
use crate::message::Event;

/// What handling one event produced.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// Formatted outbound lines, in the order they were queued.
    pub lines: Vec<String>,
    /// A plugin asked the bot to quit.
    pub shutdown: bool,
}

/// The ordered set of loaded plugins.
pub struct PluginRegistry {
    config: Arc<Config>,
    outbox: Outbox,
    catalog: Catalog,
    plugins: Vec<Plugin>,
}

impl PluginRegistry {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            outbox: Outbox::new(),
            catalog: Catalog::default(),
            plugins: Vec::new(),
        }
    }

    /// (Re)load every plugin under the configured directory.
    ///
    /// Returns how many plugins loaded. Files that fail are logged and
    /// skipped.
    pub fn load(&mut self) -> usize {
        if !self.plugins.is_empty() {
            self.unload();
        }

        let root = self.config.plugins.clone();
        let mut paths = Vec::new();
        discover(&root, &mut paths);

        for path in paths {
            match self.load_one(&path, &root) {
                Ok(plugin) => self.plugins.push(plugin),
                Err(e) => error!(path = %path.display(), error = %e, "Failed to load plugin"),
            }
        }

        self.catalog
            .replace(self.plugins.iter().map(Plugin::summary).collect());
        info!(count = self.plugins.len(), "Plugins loaded");
        self.plugins.len()
    }

    fn load_one(&self, path: &Path, root: &Path) -> Result<Plugin, crate::error::PluginError> {
        let mut plugin = Plugin::new(
            path,
            root,
            self.config.clone(),
            self.outbox.clone(),
            self.catalog.clone(),
        )?;
        plugin.load()?;
        Ok(plugin)
    }

    /// Unload every plugin, front to back.
    pub fn unload(&mut self) {
        for mut plugin in self.plugins.drain(..) {
            if let Err(e) = plugin.unload() {
                error!(plugin = %plugin.name(), error = %e, "Failed to unload plugin");
            }
        }
        self.catalog.replace(Vec::new());
    }

    /// Dispatch one event to every plugin in order.
    pub fn handle(&mut self, event: &Event) -> Dispatch {
        let Event::Message(msg) = event else {
            return Dispatch {
                lines: self.take_output(),
                shutdown: false,
            };
        };

        // Leftover requests from hooks don't apply to this message.
        self.outbox.take_flow();
        self.outbox.take_reload();

        let mut flow = Flow::Continue;
        for plugin in &mut self.plugins {
            flow = plugin.handle(msg);
            if !flow.is_continue() {
                debug!(plugin = %plugin.name(), ?flow, "Halted dispatch");
                break;
            }
        }

        if self.outbox.take_reload() {
            info!("Reloading plugins");
            self.load();
        }

        Dispatch {
            lines: self.take_output(),
            shutdown: flow == Flow::Shutdown,
        }
    }

    /// Drain lines queued outside dispatch, e.g. by `load` hooks.
    pub fn take_output(&self) -> Vec<String> {
        self.outbox.take_lines()
    }

    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    pub fn get(&self, name: &str) -> Option<&Plugin> {
        self.plugins.iter().find(|p| p.name() == name)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

impl Drop for PluginRegistry {
    fn drop(&mut self) {
        self.unload();
    }
}

/// Collect plugin files under `dir`, recursing in file-name order.
///
/// Directories and entries that can't be read are logged and skipped.
fn discover(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "Cannot read plugin directory");
            return;
        }
    };
    let mut entries: Vec<_> = entries
        .filter_map(|entry| {
            entry
                .inspect_err(|e| warn!(path = %dir.display(), error = %e, "Skipping unreadable entry"))
                .ok()
        })
        .collect();
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        match entry.file_type() {
            Ok(kind) if kind.is_dir() => discover(&path, out),
            Ok(_) if path.extension().is_some_and(|ext| ext == EXTENSION) => out.push(path),
            Ok(_) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable entry"),
        }
    }
}
