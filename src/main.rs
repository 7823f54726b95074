//! slircbot - a small scriptable IRC bot.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use slircbot::bot;
use slircbot::config::{self, Config};
use slircbot::network::Connection;
use slircbot::plugin::PluginRegistry;
use slircbot::telemetry::{self, Verbosity};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "slircbot", version, about = "A small scriptable IRC bot")]
struct Cli {
    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,

    /// Log at trace level, including wire traffic.
    #[arg(long)]
    trace: bool,

    /// TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Load plugins, then exit without connecting.
    #[arg(long)]
    check: bool,
}

impl Cli {
    fn verbosity(&self) -> Verbosity {
        if self.trace {
            Verbosity::Trace
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    telemetry::init(cli.verbosity(), config.logfile.as_deref())?;

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("configuration has {} error(s)", errors.len());
    }

    let config = Arc::new(config);
    info!(nick = %config.nick, host = %config.host, port = config.port, "Starting slircbot");

    let mut registry = PluginRegistry::new(config.clone());
    registry.load();

    if cli.check {
        info!("Finished check.");
        return Ok(());
    }

    let mut conn = Connection::new(config);
    conn.connect().await.inspect_err(|e| {
        error!(error = %e, "Failed to connect");
    })?;

    let outcome = tokio::select! {
        result = bot::run(&mut conn, &mut registry) => result.map(drop),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            Ok(())
        }
    };

    registry.unload();
    if let Ok(writer) = conn.writer()
        && let Err(e) = bot::flush(&writer, registry.take_output()).await
    {
        error!(error = %e, "Failed to queue unload output");
    }
    conn.close().await;

    info!("Stopped");
    Ok(outcome?)
}
