//! Inbound worker.
//!
//! Owns the read half of the socket. Each framed line is parsed and pushed
//! onto the bounded inbound queue; lines the parser rejects still go through
//! as [`Event::Unparsed`].

use std::sync::Arc;

use futures_util::StreamExt;
use slirc_proto::LineCodec;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::error::ConnectionError;
use crate::message::Event;

/// Socket read size.
pub const READ_CHUNK: usize = 4096;

/// Start the inbound worker on the read half of the socket.
///
/// The task ends on EOF, on a read error, or when the consumer drops the
/// queue.
pub(crate) fn spawn<R>(
    source: R,
    config: Arc<Config>,
    tx: mpsc::Sender<Event>,
) -> JoinHandle<Result<(), ConnectionError>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut framed = FramedRead::with_capacity(source, LineCodec::new(), READ_CHUNK);

        while let Some(line) = framed.next().await {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    debug!(error = %e, "inbound worker stopping");
                    return Err(ConnectionError::from(e));
                }
            };
            trace!(line = %line, "RECV");

            let event = Event::parse(line, &config);
            if let Event::Unparsed { line, error } = &event {
                warn!(line = %line, error = %error, "Error parsing line");
            }
            if tx.send(event).await.is_err() {
                debug!("inbound queue closed");
                return Ok(());
            }
        }

        debug!("server closed the connection");
        Ok(())
    })
}
