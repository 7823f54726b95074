//! Connection - the bot's single server link.
//!
//! ```text
//!              ┌──────────────┐   mpsc(256)   ┌──────────────┐
//!  socket ───▶ │ inbound task │ ────────────▶ │   Messages   │ ──▶ consumer
//!  (read)      └──────────────┘    Event      │ (auto-PONG)  │
//!                                             └──────┬───────┘
//!              ┌──────────────┐   mpsc(256)          │
//!  socket ◀─── │ outbound task│ ◀────────────────────┴──── Writer
//!  (write)     │ flood guard  │    String
//!              └──────────────┘
//! ```
//!
//! The consumer never touches the socket. Either worker dying ends the
//! event sequence.

mod handshake;
mod messages;

pub use messages::Messages;

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::writer::Writer;
use super::{reader, writer};
use crate::config::Config;
use crate::error::ConnectionError;
use crate::message::Event;

/// Slots in each of the inbound and outbound queues.
pub const QUEUE_CAPACITY: usize = 256;
/// Inbound poll timeout.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(2);
/// Pause after identifying with services.
pub const IDENTIFY_GRACE: Duration = Duration::from_secs(5);
/// Pause between channel joins.
pub const JOIN_PAUSE: Duration = Duration::from_millis(500);
/// How long [`Connection::close`] waits for queued lines to go out.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

type Worker = JoinHandle<Result<(), ConnectionError>>;

struct Link {
    writer: Writer,
    inbound: mpsc::Receiver<Event>,
    reader_task: Worker,
    writer_task: Worker,
}

impl Link {
    fn abort(&self) {
        self.reader_task.abort();
        self.writer_task.abort();
    }
}

/// A client connection.
pub struct Connection {
    config: Arc<Config>,
    link: Option<Link>,
}

impl Connection {
    /// Create an unconnected handle. Plugins can be loaded against it
    /// without ever calling [`connect`](Self::connect).
    pub fn new(config: Arc<Config>) -> Self {
        Self { config, link: None }
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Open a TCP connection to the configured server and register.
    pub async fn connect(&mut self) -> Result<(), ConnectionError> {
        let addr = (self.config.host.as_str(), self.config.port);
        info!(host = %self.config.host, port = self.config.port, "Connecting");
        let stream = TcpStream::connect(addr).await?;
        self.attach(stream).await
    }

    /// Register over an already open stream.
    ///
    /// Starts both workers, sends the handshake, answers any early PING,
    /// then joins the configured channels.
    pub async fn attach<S>(&mut self, stream: S) -> Result<(), ConnectionError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        let (in_tx, in_rx) = mpsc::channel(QUEUE_CAPACITY);
        let (out_tx, out_rx) = mpsc::channel(QUEUE_CAPACITY);

        if let Some(old) = self.link.take() {
            old.abort();
        }
        self.link = Some(Link {
            writer: Writer::new(out_tx),
            inbound: in_rx,
            reader_task: reader::spawn(read_half, Arc::clone(&self.config), in_tx),
            writer_task: writer::spawn(write_half, out_rx),
        });

        handshake::register(self).await
    }

    /// Handle onto the outbound queue.
    pub fn writer(&self) -> Result<Writer, ConnectionError> {
        self.link
            .as_ref()
            .map(|link| link.writer.clone())
            .ok_or(ConnectionError::NotConnected)
    }

    /// True while both workers are running.
    pub fn is_alive(&self) -> bool {
        self.link
            .as_ref()
            .is_some_and(|link| !link.reader_task.is_finished() && !link.writer_task.is_finished())
    }

    /// A fresh pull-based sequence of inbound events.
    pub fn messages(&mut self) -> Result<Messages<'_>, ConnectionError> {
        self.sequence(false)
    }

    /// Send whatever is still queued, then stop both workers.
    ///
    /// The outbound worker finishes once every [`Writer`] clone is gone.
    /// Lines still pending after [`CLOSE_TIMEOUT`] are lost.
    pub async fn close(&mut self) {
        let Some(link) = self.link.take() else {
            return;
        };
        let Link {
            writer,
            inbound,
            reader_task,
            mut writer_task,
        } = link;
        reader_task.abort();
        drop(inbound);
        drop(writer);

        match timeout(CLOSE_TIMEOUT, &mut writer_task).await {
            Ok(Ok(Ok(()))) => debug!("outbound queue flushed"),
            Ok(Ok(Err(e))) => warn!(error = %e, "outbound worker failed while closing"),
            Ok(Err(e)) => warn!(error = %e, "outbound worker panicked"),
            Err(_) => {
                warn!("timed out flushing outbound queue");
                writer_task.abort();
            }
        }
        info!("Disconnected");
    }

    fn sequence(&mut self, drain: bool) -> Result<Messages<'_>, ConnectionError> {
        let link = self.link.as_mut().ok_or(ConnectionError::NotConnected)?;
        Ok(Messages::new(
            &mut link.inbound,
            &link.writer,
            &link.reader_task,
            &link.writer_task,
            drain,
        ))
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(link) = self.link.take() {
            link.abort();
        }
    }
}
