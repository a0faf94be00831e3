//! Server-Sent Events decoding for OpenAI-compatible streams.

use serde_json::Value;

use crate::streaming::LineBuffer;

const DONE: &str = "[DONE]";

/// Decoder for `data: {...}` event streams terminated by `data: [DONE]`.
///
/// `event:`, comment and keep-alive lines are ignored.
///
/// ```
/// use readme_digest::backend::sse::SseDecoder;
///
/// let mut decoder = SseDecoder::new();
/// let data = b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n\n";
/// assert_eq!(decoder.decode(data).len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    lines: LineBuffer,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns the JSON payload of each completed event.
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<Value> {
        self.lines
            .push(chunk)
            .iter()
            .filter_map(|line| data_payload(line))
            .collect()
    }

    /// Decode a final event that arrived without a trailing newline.
    pub fn flush(&mut self) -> Vec<Value> {
        self.lines
            .finish()
            .and_then(|line| data_payload(&line))
            .into_iter()
            .collect()
    }
}

fn data_payload(line: &str) -> Option<Value> {
    let data = line.strip_prefix("data:")?.trim();
    if data == DONE {
        return None;
    }
    serde_json::from_str(data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_done_and_event_lines_ignored() {
        let mut decoder = SseDecoder::new();
        let chunk = b"event: message\ndata: {\"x\":1}\n\n: keep-alive\n\ndata: [DONE]\n\n";
        let values = decoder.decode(chunk);
        assert_eq!(values.len(), 1);
        assert_eq!(values[0]["x"], 1);
    }

    #[test]
    fn test_prefix_without_space() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.decode(b"data:{\"x\":2}\n").len(), 1);
    }

    #[test]
    fn test_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.decode(b"data: {\"cho").is_empty());
        let values = decoder.decode(b"ices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n");
        assert_eq!(values[0]["choices"][0]["delta"]["content"], "Hi");
    }

    #[test]
    fn test_flush_trailing_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.decode(b"data: {\"a\":3}").is_empty());
        assert_eq!(decoder.flush().len(), 1);
    }
}
