//! Schema-guided parsing: decode a `{summary, cool_facts}` JSON object.
//!
//! Strategies (in order):
//! 1. Direct decode of the preprocessed text
//! 2. A fenced ```` ```json ```` (or bare) code block
//! 3. The last balanced `{...}` object in surrounding prose
//! 4. Conservative repair of the best candidate, then decode again
//!
//! The arity rule is strict here: anything other than three facts is a
//! [`ParseError`], not something to pad.

use serde::Deserialize;

use crate::output_parser::error::{truncate, ParseError};
use crate::output_parser::extract::{fenced_block, last_object, preprocess};
use crate::output_parser::repair::try_repair_json;
use crate::types::{CandidateResult, FACT_COUNT};

#[derive(Debug, Deserialize)]
struct SchemaRecord {
    summary: String,
    #[serde(alias = "coolFacts")]
    cool_facts: Vec<String>,
}

/// Decode schema-guided model output into a candidate.
///
/// Lengths are not checked here; the validator does that for both
/// strategies alike.
///
/// ```
/// use readme_digest::output_parser::parse_schema_guided;
///
/// let raw = r#"```json
/// {"summary": "A cache.", "cool_facts": ["one fact", "two fact", "three fact"]}
/// ```"#;
/// let candidate = parse_schema_guided(raw).unwrap();
/// assert_eq!(candidate.cool_facts.len(), 3);
/// ```
pub fn parse_schema_guided(response: &str) -> Result<CandidateResult, ParseError> {
    let cleaned = preprocess(response);
    if cleaned.is_empty() {
        return Err(ParseError::EmptyResponse);
    }

    let json = locate_object(&cleaned).ok_or_else(|| ParseError::NoObject {
        text: truncate(&cleaned, 200),
    })?;

    let record = match serde_json::from_str::<SchemaRecord>(json) {
        Ok(record) => record,
        Err(first_err) => try_repair_json(json)
            .and_then(|fixed| serde_json::from_str::<SchemaRecord>(&fixed).ok())
            .ok_or_else(|| ParseError::DeserializationFailed {
                reason: first_err.to_string(),
                raw_json: truncate(json, 200),
            })?,
    };

    if record.cool_facts.len() != FACT_COUNT {
        return Err(ParseError::WrongFactCount {
            found: record.cool_facts.len(),
        });
    }

    Ok(CandidateResult::new(Some(record.summary), record.cool_facts))
}

fn locate_object(cleaned: &str) -> Option<&str> {
    if cleaned.starts_with('{') && serde_json::from_str::<serde_json::Value>(cleaned).is_ok() {
        return Some(cleaned);
    }
    if let Some(block) = fenced_block(cleaned, "json") {
        return Some(block);
    }
    last_object(cleaned).or_else(|| cleaned.find('{').map(|start| &cleaned[start..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = r#"{"summary": "A caching proxy.", "cool_facts": ["LRU with 10k entries", "Request coalescing", "Prometheus on 9090"]}"#;

    #[test]
    fn direct_object() {
        let c = parse_schema_guided(GOOD).unwrap();
        assert_eq!(c.summary.as_deref(), Some("A caching proxy."));
        assert_eq!(c.cool_facts[2], "Prometheus on 9090");
    }

    #[test]
    fn camel_case_field_accepted() {
        let raw = r#"{"summary": "s", "coolFacts": ["a", "b", "c"]}"#;
        assert_eq!(parse_schema_guided(raw).unwrap().cool_facts, vec!["a", "b", "c"]);
    }

    #[test]
    fn object_inside_prose() {
        let raw = format!("Here is the analysis you asked for:\n{}\nHope this helps!", GOOD);
        assert!(parse_schema_guided(&raw).is_ok());
    }

    #[test]
    fn fenced_object_with_think_block() {
        let raw = format!("<think>let me see</think>\n```json\n{}\n```", GOOD);
        assert!(parse_schema_guided(&raw).is_ok());
    }

    #[test]
    fn trailing_comma_repaired() {
        let raw = r#"{"summary": "s", "cool_facts": ["a", "b", "c",],}"#;
        assert!(parse_schema_guided(raw).is_ok());
    }

    #[test]
    fn truncated_object_repaired() {
        let raw = r#"{"summary": "s", "cool_facts": ["a", "b", "c"#;
        let c = parse_schema_guided(raw).unwrap();
        assert_eq!(c.cool_facts[2], "c");
    }

    #[test]
    fn empty_response() {
        assert_eq!(parse_schema_guided("  \n "), Err(ParseError::EmptyResponse));
    }

    #[test]
    fn line_format_output_is_not_an_object() {
        let raw = "Summary: A tool.\nCool fact: a\nCool fact: b\nCool fact: c";
        assert!(matches!(parse_schema_guided(raw), Err(ParseError::NoObject { .. })));
    }

    #[test]
    fn missing_field() {
        let raw = r#"{"summary": "only a summary"}"#;
        assert!(matches!(
            parse_schema_guided(raw),
            Err(ParseError::DeserializationFailed { .. })
        ));
    }

    #[test]
    fn type_mismatch() {
        let raw = r#"{"summary": 42, "cool_facts": ["a", "b", "c"]}"#;
        assert!(matches!(
            parse_schema_guided(raw),
            Err(ParseError::DeserializationFailed { .. })
        ));
    }

    #[test]
    fn wrong_fact_count() {
        let raw = r#"{"summary": "s", "cool_facts": ["a", "b", "c", "d"]}"#;
        assert_eq!(
            parse_schema_guided(raw),
            Err(ParseError::WrongFactCount { found: 4 })
        );
    }
}
