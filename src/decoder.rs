//! Incremental UTF-8 decoding for chunked response bodies.
//!
//! Chunk boundaries on the wire carry no meaning and may fall inside a
//! multi-byte sequence, so bytes of an unfinished character are held back
//! until the next chunk completes them.

use std::char::REPLACEMENT_CHARACTER;

#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes as much of `bytes` (after anything held back) as forms complete
    /// characters. Invalid sequences become U+FFFD; a trailing incomplete
    /// sequence is kept for the next call.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::with_capacity(self.pending.len());
        let mut consumed = 0;

        while consumed < self.pending.len() {
            let rest = &self.pending[consumed..];
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    consumed = self.pending.len();
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&rest[..valid]) {
                        out.push_str(text);
                    }
                    match err.error_len() {
                        Some(bad) => {
                            out.push(REPLACEMENT_CHARACTER);
                            consumed += valid + bad;
                        }
                        None => {
                            consumed += valid;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..consumed);
        out
    }

    /// Flushes whatever is still held back at end of stream.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
