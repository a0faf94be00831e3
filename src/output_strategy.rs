//! Output strategy: which parser reads the model's answer.
//!
//! [`OutputStrategy`] is chosen once, in configuration. It decides the
//! format instructions embedded in the prompt, the parser applied to the
//! response, and the fallback profile used when anything fails. The two
//! strategies are alternatives and are never mixed within one analysis.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::output_parser::{self, ParseError};
use crate::types::CandidateResult;

/// Controls how raw model text becomes a candidate result.
///
/// # Example
///
/// ```
/// use readme_digest::OutputStrategy;
///
/// let strategy = OutputStrategy::default();
/// assert_eq!(strategy, OutputStrategy::LineFormat);
/// let candidate = strategy.parse("Summary: A compact JSON codec.").unwrap();
/// assert_eq!(candidate.summary.as_deref(), Some("A compact JSON codec."));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStrategy {
    /// `Summary:` / `Cool fact:` lines. Always yields a candidate.
    #[default]
    LineFormat,

    /// A JSON object matching the result schema. Fails on any shape error.
    SchemaGuided,
}

impl OutputStrategy {
    /// Stable name for logs and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            OutputStrategy::LineFormat => "line_format",
            OutputStrategy::SchemaGuided => "schema_guided",
        }
    }

    /// Parse raw model output with this strategy.
    pub fn parse(&self, raw: &str) -> Result<CandidateResult, ParseError> {
        match self {
            OutputStrategy::LineFormat => Ok(output_parser::parse_line_format(raw)),
            OutputStrategy::SchemaGuided => output_parser::parse_schema_guided(raw),
        }
    }

    /// Whether the backend should be asked for JSON output.
    pub fn wants_json(&self) -> bool {
        matches!(self, OutputStrategy::SchemaGuided)
    }
}

impl FromStr for OutputStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" | "lines" | "line_format" => Ok(OutputStrategy::LineFormat),
            "schema" | "json" | "schema_guided" => Ok(OutputStrategy::SchemaGuided),
            _ => Err(ConfigError::InvalidValue {
                key: "strategy",
                value: s.to_string(),
                reason: "expected `line` or `schema`".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for OutputStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_line_format() {
        assert_eq!(OutputStrategy::default(), OutputStrategy::LineFormat);
    }

    #[test]
    fn test_line_format_never_fails() {
        assert!(OutputStrategy::LineFormat.parse("{ not json").is_ok());
    }

    #[test]
    fn test_schema_guided_rejects_line_output() {
        assert!(OutputStrategy::SchemaGuided
            .parse("Summary: words\nCool fact: more words")
            .is_err());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("schema".parse::<OutputStrategy>().unwrap(), OutputStrategy::SchemaGuided);
        assert_eq!(" Line ".parse::<OutputStrategy>().unwrap(), OutputStrategy::LineFormat);
        assert!("yaml".parse::<OutputStrategy>().is_err());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&OutputStrategy::SchemaGuided).unwrap(),
            "\"schema_guided\""
        );
    }
}
