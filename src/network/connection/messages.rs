//! Pull-based inbound event sequence.

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::debug;

use super::{POLL_TIMEOUT, Worker};
use crate::message::{Event, Message};
use crate::network::writer::Writer;

/// Lazy sequence of inbound events, borrowed from a
/// [`Connection`](super::Connection).
///
/// Every PING is answered with a PONG carrying the same payload before
/// [`next`](Self::next) returns it, so callers see the PING but never have
/// to answer it.
pub struct Messages<'a> {
    inbound: &'a mut mpsc::Receiver<Event>,
    writer: &'a Writer,
    reader_task: &'a Worker,
    writer_task: &'a Worker,
    drain: bool,
}

impl<'a> Messages<'a> {
    pub(super) fn new(
        inbound: &'a mut mpsc::Receiver<Event>,
        writer: &'a Writer,
        reader_task: &'a Worker,
        writer_task: &'a Worker,
        drain: bool,
    ) -> Self {
        Self {
            inbound,
            writer,
            reader_task,
            writer_task,
            drain,
        }
    }

    /// Next inbound event.
    ///
    /// Returns `None` once either worker has stopped, or, in drain mode,
    /// as soon as a poll comes back empty.
    pub async fn next(&mut self) -> Option<Event> {
        loop {
            if self.reader_task.is_finished() || self.writer_task.is_finished() {
                return None;
            }

            match timeout(POLL_TIMEOUT, self.inbound.recv()).await {
                Ok(Some(event)) => {
                    if let Event::Message(msg) = &event
                        && msg.event.as_deref() == Some("PING")
                        && let Err(e) = self.writer.write(&["PONG"], Some(ping_token(msg))).await
                    {
                        debug!(error = %e, "failed to queue PONG");
                    }
                    return Some(event);
                }
                Ok(None) => return None,
                Err(_) if self.drain => return None,
                Err(_) => continue,
            }
        }
    }
}

/// `PING :token` and a bare `PING token` both carry the token.
fn ping_token(msg: &Message) -> &str {
    if msg.text.is_empty() {
        msg.target.as_deref().unwrap_or_default()
    } else {
        &msg.text
    }
}
