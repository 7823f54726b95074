//! The consumer loop: events in, plugin output out.

use tracing::{debug, info};

use crate::error::ConnectionError;
use crate::network::{Connection, Writer};
use crate::plugin::PluginRegistry;

/// Queue already formatted lines on the outbound worker.
pub async fn flush(writer: &Writer, lines: Vec<String>) -> Result<(), ConnectionError> {
    for line in lines {
        writer.send_line(line).await?;
    }
    Ok(())
}

/// Dispatch events until the connection ends or a plugin asks to quit.
///
/// Returns `true` when a plugin requested shutdown.
pub async fn run(conn: &mut Connection, registry: &mut PluginRegistry) -> Result<bool, ConnectionError> {
    let writer = conn.writer()?;
    flush(&writer, registry.take_output()).await?;

    let mut messages = conn.messages()?;
    while let Some(event) = messages.next().await {
        let dispatch = registry.handle(&event);
        if !dispatch.lines.is_empty() {
            debug!(lines = dispatch.lines.len(), "Queueing replies");
        }
        flush(&writer, dispatch.lines).await?;

        if dispatch.shutdown {
            info!("Shutdown requested by plugin");
            return Ok(true);
        }
    }

    info!("Connection closed");
    Ok(false)
}
