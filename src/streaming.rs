//! Line-oriented decoding of streamed HTTP bodies.
//!
//! Network chunks split lines (and multi-byte characters) at arbitrary
//! points. [`LineBuffer`] holds raw bytes until a full line is available;
//! [`NdjsonDecoder`] builds on it for Ollama's newline-delimited JSON.

use serde_json::Value;

/// Byte buffer that yields complete `\n`-terminated lines.
///
/// Bytes are only decoded once a whole line is present, so a UTF-8
/// sequence split across chunks is never mangled.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed, trimmed.
    /// Blank lines are skipped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw).trim().to_string();
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }

    /// Take whatever is left after the stream ended.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        let line = String::from_utf8_lossy(&rest).trim().to_string();
        (!line.is_empty()).then_some(line)
    }
}

/// Decoder for newline-delimited JSON streams.
///
/// # Example
///
/// ```
/// use readme_digest::streaming::NdjsonDecoder;
///
/// let mut decoder = NdjsonDecoder::new();
/// assert!(decoder.decode(b"{\"response\":").is_empty());
/// let values = decoder.decode(b"\"Summary\"}\n");
/// assert_eq!(values[0]["response"], "Summary");
/// ```
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    lines: LineBuffer,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns the JSON values of all completed lines.
    /// Lines that are not valid JSON are skipped.
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<Value> {
        self.lines
            .push(chunk)
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// Parse a trailing line that had no terminating newline.
    pub fn flush(&mut self) -> Option<Value> {
        self.lines
            .finish()
            .and_then(|line| serde_json::from_str(&line).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_line_buffer_split_across_chunks() {
        let mut buf = LineBuffer::new();
        assert!(buf.push(b"Summary: a ").is_empty());
        assert_eq!(buf.push(b"tool\nCool"), vec!["Summary: a tool"]);
        assert_eq!(buf.finish().as_deref(), Some("Cool"));
    }

    #[test]
    fn test_line_buffer_multibyte_split() {
        let bytes = "café\n".as_bytes();
        let mut buf = LineBuffer::new();
        // split inside the two-byte 'é'
        assert!(buf.push(&bytes[..4]).is_empty());
        assert_eq!(buf.push(&bytes[4..]), vec!["café"]);
    }

    #[test]
    fn test_line_buffer_skips_blank_lines() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"\n\r\n  \na\n"), vec!["a"]);
        assert!(buf.finish().is_none());
    }

    #[test]
    fn test_ndjson_ollama_stream() {
        let mut decoder = NdjsonDecoder::new();
        let stream = concat!(
            "{\"model\":\"llama3\",\"response\":\"Summary:\"}\n",
            "{\"model\":\"llama3\",\"response\":\" A cache.\"}\n",
            "{\"model\":\"llama3\",\"response\":\"\",\"done\":true}\n",
        )
        .as_bytes();

        let mut values = Vec::new();
        for chunk in stream.chunks(13) {
            values.extend(decoder.decode(chunk));
        }

        assert_eq!(values.len(), 3);
        assert_eq!(values[1]["response"], " A cache.");
        assert_eq!(values[2]["done"], json!(true));
    }

    #[test]
    fn test_ndjson_garbage_lines_skipped() {
        let mut decoder = NdjsonDecoder::new();
        let values = decoder.decode(b"not json\n{\"ok\":true}\n");
        assert_eq!(values, vec![json!({"ok": true})]);
    }

    #[test]
    fn test_ndjson_flush_unterminated() {
        let mut decoder = NdjsonDecoder::new();
        decoder.decode(b"{\"done\":true}");
        assert_eq!(decoder.flush(), Some(json!({"done": true})));
        assert_eq!(decoder.flush(), None);
    }
}
