//! Plugin directory fixtures.

use std::path::Path;
use std::sync::Arc;

use slircbot::config::Config;
use tempfile::TempDir;

/// A throwaway plugin directory.
pub struct PluginDir {
    dir: TempDir,
}

impl PluginDir {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write (or overwrite) `name` under the directory.
    pub fn write(&self, name: &str, source: &str) -> anyhow::Result<()> {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, source)?;
        Ok(())
    }

    /// Config named `Bot`, owned by `root`, loading from this directory.
    pub fn config(&self) -> Arc<Config> {
        Arc::new(Config {
            nick: "Bot".to_string(),
            user: "bot".to_string(),
            name: "Test Bot".to_string(),
            owners: vec!["root".to_string()],
            plugins: self.dir.path().to_path_buf(),
            ..Config::default()
        })
    }
}
