//! Line framing for the board's text telemetry.
//!
//! The board writes ASCII lines terminated by `\n`. Serial reads return
//! whatever happens to be available, so a line can arrive split across any
//! number of chunks:
//! ```text
//! read 1: "M0:X=+01"
//! read 2: "0 Y=+020 Z=+030\nM1:T=2"
//! read 3: "3.50C\n"
//! ```
//! The framer keeps the unterminated tail between reads.

use bytes::{Buf, BytesMut};

/// Line delimiter.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Character substituted for bytes outside 7-bit ASCII.
pub const REPLACEMENT: char = char::REPLACEMENT_CHARACTER;

/// Decodes a byte slice as ASCII, replacing non-ASCII bytes.
#[must_use]
pub fn decode_ascii_lossy(data: &[u8]) -> String {
    data.iter()
        .map(|&b| if b.is_ascii() { char::from(b) } else { REPLACEMENT })
        .collect()
}

/// Line framer that handles partial data.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: BytesMut,
    // Prefix of `buffer` already known to hold no terminator
    scanned: usize,
}

impl LineFramer {
    /// Creates a new line framer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
            scanned: 0,
        }
    }

    /// Feeds a chunk and returns every line it completed, in order.
    ///
    /// Lines are trimmed; empty lines are dropped.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        std::iter::from_fn(|| self.next_line()).collect()
    }

    /// Extracts the next complete, non-empty line from the buffer.
    ///
    /// Returns `None` once only an unterminated tail (or nothing) remains.
    pub fn next_line(&mut self) -> Option<String> {
        while let Some(offset) = self.buffer[self.scanned..]
            .iter()
            .position(|&b| b == LINE_TERMINATOR)
        {
            let raw = self.buffer.split_to(self.scanned + offset);
            self.buffer.advance(1);
            self.scanned = 0;

            let line = decode_ascii_lossy(&raw);
            let line = line.trim();
            if !line.is_empty() {
                return Some(line.to_owned());
            }
        }
        self.scanned = self.buffer.len();
        None
    }

    /// Returns the number of bytes currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Clears the internal buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
    }
}
