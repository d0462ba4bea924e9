/// Incremental UTF-8 decoding for byte chunks that may split a code point.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes as much as possible; an incomplete trailing sequence is kept for
    /// the next call and invalid bytes become U+FFFD.
    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        loop {
            let (valid, error_len) = match std::str::from_utf8(&self.pending) {
                Ok(_) => (self.pending.len(), None),
                Err(e) => (e.valid_up_to(), Some(e.error_len())),
            };
            out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
            match error_len {
                // Fully valid.
                None => {
                    self.pending.clear();
                    break;
                }
                // Incomplete trailing sequence.
                Some(None) => {
                    self.pending.drain(..valid);
                    break;
                }
                Some(Some(invalid)) => {
                    out.push(char::REPLACEMENT_CHARACTER);
                    self.pending.drain(..valid + invalid);
                }
            }
        }
        out
    }

    /// Flushes whatever is left at end of stream.
    pub fn finish(&mut self) -> String {
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }
}
