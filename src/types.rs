use serde::{Deserialize, Serialize};

/// Minimum summary length, in characters.
pub const SUMMARY_MIN_CHARS: usize = 10;
/// Maximum summary length, in characters.
pub const SUMMARY_MAX_CHARS: usize = 500;
/// Minimum length of each cool fact, in characters.
pub const FACT_MIN_CHARS: usize = 10;
/// Number of cool facts in every result.
pub const FACT_COUNT: usize = 3;

/// Length as the schema counts it: Unicode scalar values.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// A schema-conformant analysis of one README.
///
/// Inside the crate only the validator and the fallback synthesizer build
/// these. Deserialized values go through the same length checks, so every
/// value satisfies the summary and fact constraints. The fact count is
/// carried by the type itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawAnalysis")]
pub struct AnalysisResult {
    summary: String,
    cool_facts: [String; FACT_COUNT],
}

/// Wire shape of [`AnalysisResult`] before the length checks.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    summary: String,
    #[serde(alias = "cool_facts")]
    cool_facts: [String; FACT_COUNT],
}

impl TryFrom<RawAnalysis> for AnalysisResult {
    type Error = String;

    fn try_from(raw: RawAnalysis) -> Result<Self, Self::Error> {
        let result = Self::from_parts(raw.summary, raw.cool_facts);
        crate::validator::validate_result(&result).map_err(|violations| violations.join("; "))?;
        Ok(result)
    }
}

impl AnalysisResult {
    pub(crate) fn from_parts(summary: String, cool_facts: [String; FACT_COUNT]) -> Self {
        Self {
            summary,
            cool_facts,
        }
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn cool_facts(&self) -> &[String; FACT_COUNT] {
        &self.cool_facts
    }

    pub fn into_parts(self) -> (String, [String; FACT_COUNT]) {
        (self.summary, self.cool_facts)
    }
}

/// Untrusted parser output awaiting validation.
///
/// Nothing about lengths or counts is assumed here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateResult {
    pub summary: Option<String>,
    pub cool_facts: Vec<String>,
}

impl CandidateResult {
    pub fn new(summary: Option<String>, cool_facts: Vec<String>) -> Self {
        Self {
            summary,
            cool_facts,
        }
    }
}
