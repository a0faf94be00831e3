//! Error type for the schema-guided parser.

/// Why model output could not be decoded into a candidate result.
///
/// The line-format strategy never produces these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The model response was empty or whitespace-only after cleanup.
    #[error("empty LLM response")]
    EmptyResponse,

    /// No JSON object could be located in the response.
    #[error("no JSON object found in LLM response: {text}")]
    NoObject {
        /// A truncated copy of the cleaned response (max 200 chars).
        text: String,
    },

    /// An object was found but does not have the expected shape.
    #[error("JSON deserialization failed: {reason}")]
    DeserializationFailed {
        /// The serde error message.
        reason: String,
        /// The JSON that failed, truncated to 200 chars.
        raw_json: String,
    },

    /// `cool_facts` decoded but did not hold exactly three items.
    #[error("expected exactly 3 cool facts, found {found}")]
    WrongFactCount { found: usize },
}

/// Truncate to at most `max_chars` characters, appending "..." if cut.
pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
