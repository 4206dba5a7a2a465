//! Line splitter for command-mode replies.
//!
//! The radio answers each command-mode request with one line terminated by a
//! carriage return (`\r`). Every terminator ends a line, including back to
//! back ones, so an empty reply is still a reply.

use bytes::{Buf, BytesMut};
use digimesh_common::LINE_TERMINATOR;

/// Initial buffer capacity; replies are short (`OK`, a hex value, an ID).
const INITIAL_CAPACITY: usize = 64;

/// Accumulates received bytes and splits them into reply lines.
#[derive(Debug)]
pub struct LineCodec {
    buffer: BytesMut,
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl LineCodec {
    /// Create a new line codec.
    pub fn new() -> Self {
        LineCodec {
            buffer: BytesMut::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Take the next complete line, without its terminator.
    pub fn decode_line(&mut self) -> Option<Vec<u8>> {
        let end = self.buffer.iter().position(|&b| b == LINE_TERMINATOR)?;
        let line = self.buffer.split_to(end);
        // Drop the terminator
        self.buffer.advance(1);
        Some(line.to_vec())
    }

    /// Bytes received since the last terminator.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Discard any partial line.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
