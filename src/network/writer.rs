//! Outbound worker and the handle used to feed it.
//!
//! Lines are formatted and sanitised by the caller side ([`Writer`]), queued,
//! and written one at a time by a dedicated task that applies flood control
//! and loop suppression before each send.

use futures_util::SinkExt;
use slirc_proto::{LineCodec, ctcp, format};
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tokio_util::codec::FramedWrite;
use tracing::{debug, trace};

use super::flood::FloodGuard;
use crate::error::ConnectionError;

/// `PRIVMSG recip :text`
pub fn msg_line(recip: &str, text: &str) -> String {
    format::line(&["PRIVMSG", recip], Some(text))
}

/// `NOTICE recip :text`
pub fn notice_line(recip: &str, text: &str) -> String {
    format::line(&["NOTICE", recip], Some(text))
}

/// CTCP ACTION to `recip`.
pub fn action_line(recip: &str, text: &str) -> String {
    msg_line(recip, &ctcp::action(text))
}

/// Cloneable handle onto the outbound queue.
#[derive(Clone, Debug)]
pub struct Writer {
    tx: mpsc::Sender<String>,
}

impl Writer {
    pub(crate) fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }

    /// Queue an already formatted line (terminator included).
    pub async fn send_line(&self, line: String) -> Result<(), ConnectionError> {
        self.tx.send(line).await?;
        Ok(())
    }

    /// Queue `args` joined by spaces, with optional trailing text.
    pub async fn write<A: AsRef<str>>(
        &self,
        args: &[A],
        text: Option<&str>,
    ) -> Result<(), ConnectionError> {
        self.send_line(format::line(args, text)).await
    }

    pub async fn msg(&self, recip: &str, text: &str) -> Result<(), ConnectionError> {
        self.send_line(msg_line(recip, text)).await
    }

    pub async fn notice(&self, recip: &str, text: &str) -> Result<(), ConnectionError> {
        self.send_line(notice_line(recip, text)).await
    }

    pub async fn action(&self, recip: &str, text: &str) -> Result<(), ConnectionError> {
        self.send_line(action_line(recip, text)).await
    }

    /// False once the outbound worker has stopped.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Start the outbound worker on the write half of the socket.
///
/// The task ends when every [`Writer`] is dropped or a write fails.
pub(crate) fn spawn<W>(sink: W, mut rx: mpsc::Receiver<String>) -> JoinHandle<Result<(), ConnectionError>>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut framed = FramedWrite::new(sink, LineCodec::new());
        let mut guard = FloodGuard::new();

        while let Some(line) = rx.recv().await {
            let wait = guard.delay(line.as_bytes(), Instant::now());
            if !wait.is_zero() {
                trace!(secs = wait.as_secs_f64(), "SLEEP");
                sleep(wait).await;
            }

            if guard.is_looping(line.as_bytes(), Instant::now()) {
                trace!(line = %line.trim_end(), "DROP");
                continue;
            }

            trace!(line = %line.trim_end(), "SEND");
            let bytes = line.as_bytes().to_vec();
            if let Err(e) = framed.send(line).await {
                debug!(error = %e, "outbound worker stopping");
                return Err(ConnectionError::from(e));
            }
            guard.record(&bytes, Instant::now());
        }

        debug!("outbound queue closed");
        framed.close().await?;
        Ok(())
    })
}
