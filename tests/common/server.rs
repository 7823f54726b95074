//! Scripted in-memory IRC server.
//!
//! The bot side gets one end of a `tokio::io::duplex` pipe; the test drives
//! the other end line by line.

use std::time::Duration;

use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf,
};
use tokio::time::timeout;

const PIPE_CAPACITY: usize = 64 * 1024;

/// The server end of an in-memory connection.
pub struct TestServer {
    reader: BufReader<ReadHalf<DuplexStream>>,
    writer: WriteHalf<DuplexStream>,
}

impl TestServer {
    /// A server plus the stream to hand to `Connection::attach`.
    pub fn pair() -> (Self, DuplexStream) {
        let (ours, theirs) = tokio::io::duplex(PIPE_CAPACITY);
        let (read_half, write_half) = tokio::io::split(ours);
        let server = Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        };
        (server, theirs)
    }

    /// Send one line; `\r\n` is appended when missing.
    pub async fn send_raw(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        if !line.ends_with('\n') {
            self.writer.write_all(b"\r\n").await?;
        }
        self.writer.flush().await?;
        Ok(())
    }

    /// Next line from the bot, terminator stripped.
    pub async fn recv(&mut self) -> anyhow::Result<String> {
        self.recv_timeout(Duration::from_secs(30)).await
    }

    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(dur, self.reader.read_line(&mut line)).await??;
        anyhow::ensure!(n > 0, "bot closed the connection");
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Read lines until one satisfies `predicate`, returning all of them.
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<Vec<String>>
    where
        F: FnMut(&str) -> bool,
    {
        let mut lines = Vec::new();
        loop {
            let line = self.recv().await?;
            let done = predicate(&line);
            lines.push(line);
            if done {
                return Ok(lines);
            }
        }
    }

    /// Read the registration burst (NICK and USER).
    pub async fn accept_registration(&mut self) -> anyhow::Result<Vec<String>> {
        self.recv_until(|line| line.starts_with("USER ")).await
    }
}
