//! Core configuration types and loading.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::defaults::{
    default_command_prefix, default_host, default_name, default_nick, default_plugins,
    default_port, default_user,
};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration.
///
/// Every key is optional. The nickname is fixed for the life of a
/// connection because plugin patterns are compiled against it.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server hostname.
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Nickname.
    #[serde(default = "default_nick")]
    pub nick: String,
    /// Username (ident).
    #[serde(default = "default_user")]
    pub user: String,
    /// Real name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Server password, sent as PASS.
    #[serde(default)]
    pub serverpass: Option<String>,
    /// Services password, sent to NickServ as IDENTIFY.
    #[serde(default)]
    pub nickpass: Option<String>,
    /// Channels joined after the handshake, in order.
    #[serde(default)]
    pub channels: Vec<Channel>,
    /// Nicks allowed to run owner-only actions.
    #[serde(default)]
    pub owners: Vec<String>,
    /// Plugin root directory.
    #[serde(default = "default_plugins")]
    pub plugins: PathBuf,
    /// Prefix for addressing commands without the nickname.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    /// Log file (append). Logs go to stderr when unset.
    #[serde(default)]
    pub logfile: Option<PathBuf>,
    /// Script operation cap per call; 0 disables the cap.
    #[serde(default)]
    pub script_max_operations: u64,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// True if `nick` is literally present in the owner list.
    pub fn is_owner(&self, nick: &str) -> bool {
        self.owners.iter().any(|owner| owner == nick)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            nick: default_nick(),
            user: default_user(),
            name: default_name(),
            serverpass: None,
            nickpass: None,
            channels: Vec::new(),
            owners: Vec::new(),
            plugins: default_plugins(),
            command_prefix: default_command_prefix(),
            logfile: None,
            script_max_operations: 0,
        }
    }
}

/// A channel to join, with an optional key.
///
/// Written in TOML as `"#chan"` or `["#chan", "key"]`. Names are trimmed
/// and get a leading `#` when they lack one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "ChannelEntry")]
pub struct Channel {
    pub name: String,
    pub key: Option<String>,
}

impl Channel {
    pub fn new(name: &str, key: Option<&str>) -> Self {
        let name = name.trim();
        let name = if name.starts_with('#') {
            name.to_string()
        } else {
            format!("#{name}")
        };
        Self {
            name,
            key: key.map(str::to_string),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChannelEntry {
    Name(String),
    Keyed(String, String),
}

impl From<ChannelEntry> for Channel {
    fn from(entry: ChannelEntry) -> Self {
        match entry {
            ChannelEntry::Name(name) => Channel::new(&name, None),
            ChannelEntry::Keyed(name, key) => Channel::new(&name, Some(key.as_str())),
        }
    }
}
