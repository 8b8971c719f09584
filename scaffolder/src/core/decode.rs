//! Incremental UTF-8 decoding of PTY output chunks.

/// Decodes byte chunks to text, carrying incomplete multi-byte sequences over
/// to the next chunk. Invalid bytes become U+FFFD.
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    pending: Vec<u8>,
}

/// Longest possible UTF-8 encoding of a single scalar value.
const MAX_SEQUENCE_LEN: usize = 4;

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `pending + chunk` as forms complete characters.
    pub fn push(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return out;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    // Prefix up to `valid` is well-formed.
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match err.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            // Truncated sequence at the end: keep it for the next chunk.
                            self.pending.drain(..valid);
                            debug_assert!(self.pending.len() < MAX_SEQUENCE_LEN);
                            return out;
                        }
                    }
                }
            }
        }
    }

    /// Flush any leftover bytes once the stream has ended.
    pub fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}
