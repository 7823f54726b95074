//! Line-based codec for tokio.
//!
//! Splits a byte stream on `\n`, strips trailing `\r`, and decodes each line
//! to text. Bytes after the last newline stay buffered until the next read
//! completes the line.

use std::borrow::Cow;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

use crate::error;

/// Default cap on a buffered, not yet terminated line.
///
/// Server lines carrying IRCv3 tags can exceed 512 bytes, so this is far
/// above the classic limit. Anything longer is discarded up to the next
/// newline rather than buffered without bound.
pub const DEFAULT_MAX_LINE_LEN: usize = 16 * 1024;

/// Decode one line of bytes to text.
///
/// UTF-8 is tried first. On failure the bytes are read as Latin-1, which
/// assigns a character to every byte value, so decoding never fails.
///
/// ```
/// use slirc_proto::decode_line;
///
/// assert_eq!(decode_line("café".as_bytes()), "café");
/// assert_eq!(decode_line(b"caf\xe9"), "café");
/// ```
pub fn decode_line(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

/// Line-based codec that handles newline-terminated messages.
#[derive(Debug)]
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum buffered line length
    max_len: usize,
    /// Skipping the remainder of an oversized line
    discarding: bool,
}

impl LineCodec {
    /// Create a new codec with the default line cap.
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LINE_LEN)
    }

    /// Create a new codec with custom max line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            discarding: false,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = error::ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                if src.len() > self.max_len {
                    if !self.discarding {
                        warn!(
                            len = src.len(),
                            limit = self.max_len,
                            "discarding oversized line"
                        );
                    }
                    self.discarding = true;
                    src.clear();
                    self.next_index = 0;
                } else {
                    // No complete line yet - remember where we stopped
                    self.next_index = src.len();
                }
                return Ok(None);
            };

            let end = self.next_index + offset;
            let mut line = src.split_to(end + 1);
            self.next_index = 0;

            if self.discarding {
                // Tail of an oversized line
                self.discarding = false;
                continue;
            }

            line.truncate(end);
            while line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }

            return Ok(Some(decode_line(&line).into_owned()));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if !src.is_empty() {
            debug!(len = src.len(), "dropping unterminated line at end of stream");
            src.clear();
        }
        self.next_index = 0;
        self.discarding = false;
        Ok(None)
    }
}

impl Encoder<String> for LineCodec {
    type Error = error::ProtocolError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> error::Result<()> {
        dst.extend_from_slice(line.as_bytes());
        Ok(())
    }
}
