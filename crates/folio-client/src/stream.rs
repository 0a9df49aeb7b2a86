//! Incremental decoding of a chunked text response body.
//!
//! Network chunks can split a multi-byte UTF-8 scalar. The decoder emits
//! each chunk's text as soon as it is available and carries over only the
//! trailing bytes of an incomplete scalar to the next chunk.

/// Streaming UTF-8 decoder that buffers at most one partial scalar.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    /// Trailing bytes of an incomplete scalar from the previous chunk.
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk of bytes, returning all complete text it contains.
    ///
    /// Invalid byte sequences are replaced with U+FFFD rather than failing;
    /// a truncated scalar at the end of the chunk is held back until the
    /// next call completes it.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                let out = text.to_string();
                self.pending.clear();
                out
            }
            Err(e) => {
                let valid = e.valid_up_to();
                // error_len() == None means the error is a scalar truncated
                // at the end of input: hold those bytes for the next chunk.
                if e.error_len().is_none() {
                    let out = std::str::from_utf8(&self.pending[..valid])
                        .unwrap_or_default()
                        .to_string();
                    self.pending.drain(..valid);
                    out
                } else {
                    let out = String::from_utf8_lossy(&self.pending).into_owned();
                    self.pending.clear();
                    out
                }
            }
        }
    }

    /// Flush any bytes still held after the source is exhausted.
    ///
    /// A non-empty remainder means the stream ended mid-scalar; it is
    /// decoded lossily so no input is silently dropped.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let out = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        out
    }
}

/// Drive the decoder over an iterator of byte chunks.
///
/// Invokes `on_token` once per chunk with the decoded text and returns the
/// accumulated full string once the source is exhausted.
pub fn consume_chunks<I, C, F>(chunks: I, mut on_token: F) -> String
where
    I: IntoIterator<Item = C>,
    C: AsRef<[u8]>,
    F: FnMut(&str),
{
    let mut decoder = Utf8ChunkDecoder::new();
    let mut accumulated = String::new();

    for chunk in chunks {
        let text = decoder.decode(chunk.as_ref());
        if !text.is_empty() {
            on_token(&text);
            accumulated.push_str(&text);
        }
    }

    let tail = decoder.finish();
    if !tail.is_empty() {
        on_token(&tail);
        accumulated.push_str(&tail);
    }

    accumulated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_ascii_chunks() {
        let mut tokens = Vec::new();
        let full = consume_chunks([b"Hel".as_slice(), b"lo".as_slice()], |t| {
            tokens.push(t.to_string())
        });
        assert_eq!(tokens, vec!["Hel", "lo"]);
        assert_eq!(full, "Hello");
    }

    #[test]
    fn test_multibyte_scalar_split_across_chunks() {
        // "é" is 0xC3 0xA9; split it between two chunks.
        let mut decoder = Utf8ChunkDecoder::new();
        assert_eq!(decoder.decode(&[b'a', 0xC3]), "a");
        assert_eq!(decoder.decode(&[0xA9, b'b']), "\u{e9}b");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_four_byte_scalar_split_three_ways() {
        // U+1F600 is F0 9F 98 80.
        let bytes = "\u{1F600}".as_bytes();
        let mut decoder = Utf8ChunkDecoder::new();
        assert_eq!(decoder.decode(&bytes[..1]), "");
        assert_eq!(decoder.decode(&bytes[1..3]), "");
        assert_eq!(decoder.decode(&bytes[3..]), "\u{1F600}");
    }

    #[test]
    fn test_split_scalar_emits_no_empty_token() {
        let mut tokens = Vec::new();
        let full = consume_chunks(
            [&[0xC3u8][..], &[0xA9u8][..]],
            |t| tokens.push(t.to_string()),
        );
        // The first chunk holds the partial scalar; only one token fires.
        assert_eq!(tokens, vec!["\u{e9}"]);
        assert_eq!(full, "\u{e9}");
    }

    #[test]
    fn test_invalid_bytes_replaced_not_fatal() {
        let mut decoder = Utf8ChunkDecoder::new();
        let out = decoder.decode(&[b'a', 0xFF, b'b']);
        assert!(out.starts_with('a'));
        assert!(out.contains('\u{FFFD}'));
        assert!(out.ends_with('b'));
    }

    #[test]
    fn test_truncated_stream_flushed_lossily() {
        let mut decoder = Utf8ChunkDecoder::new();
        assert_eq!(decoder.decode(&[b'x', 0xC3]), "x");
        // Stream ends mid-scalar: the pending byte is not dropped.
        assert_eq!(decoder.finish(), "\u{FFFD}");
    }

    #[test]
    fn test_empty_chunk_produces_nothing() {
        let mut decoder = Utf8ChunkDecoder::new();
        assert_eq!(decoder.decode(b""), "");
    }

    #[test]
    fn test_consume_empty_source() {
        let mut calls = 0;
        let full = consume_chunks(std::iter::empty::<&[u8]>(), |_| calls += 1);
        assert_eq!(calls, 0);
        assert_eq!(full, "");
    }

    #[test]
    fn test_accumulation_over_many_chunks() {
        let chunks: Vec<&[u8]> = vec![b"one ", b"two ", b"three"];
        let mut count = 0;
        let full = consume_chunks(chunks, |_| count += 1);
        assert_eq!(count, 3);
        assert_eq!(full, "one two three");
    }
}
