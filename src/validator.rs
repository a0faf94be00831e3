//! Schema validation and normalization of candidate results.
//!
//! The fact list is always normalized to exactly three valid entries. The
//! summary is only truncated when too long; a missing or too-short summary
//! rejects the candidate and the caller falls back.

use crate::error::{RejectedField, ValidationRejection};
use crate::types::{
    char_len, AnalysisResult, CandidateResult, FACT_COUNT, FACT_MIN_CHARS, SUMMARY_MAX_CHARS,
    SUMMARY_MIN_CHARS,
};

const ELLIPSIS: &str = "...";

/// Checks candidates against the result schema.
///
/// `filler_fact` pads short lists and replaces short facts. It comes from
/// the active fallback profile and must itself be a valid fact.
#[derive(Debug, Clone, Copy)]
pub struct SchemaValidator {
    filler_fact: &'static str,
}

impl SchemaValidator {
    pub fn new(filler_fact: &'static str) -> Self {
        debug_assert!(char_len(filler_fact) >= FACT_MIN_CHARS);
        Self { filler_fact }
    }

    /// Normalize `candidate` into a conformant result or reject it.
    ///
    /// 1. Facts beyond the third are dropped; missing ones are padded.
    /// 2. Facts under the minimum length (measured trimmed) are replaced in
    ///    place. Kept facts are returned exactly as given.
    /// 3. A summary over the maximum is truncated.
    /// 4. A missing or short summary rejects the candidate, carrying the
    ///    normalized facts.
    pub fn validate(&self, candidate: CandidateResult) -> Result<AnalysisResult, ValidationRejection> {
        let facts = self.normalize_facts(candidate.cool_facts);

        let summary = candidate
            .summary
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        if summary.is_empty() {
            return Err(ValidationRejection {
                field: RejectedField::Summary,
                reason: "is missing".to_string(),
                normalized_facts: facts,
            });
        }
        let len = char_len(&summary);
        if len < SUMMARY_MIN_CHARS {
            return Err(ValidationRejection {
                field: RejectedField::Summary,
                reason: format!("has {len} characters, minimum is {SUMMARY_MIN_CHARS}"),
                normalized_facts: facts,
            });
        }

        Ok(AnalysisResult::from_parts(truncate_summary(summary), facts))
    }

    fn normalize_facts(&self, facts: Vec<String>) -> [String; FACT_COUNT] {
        let mut facts = facts.into_iter();
        std::array::from_fn(|_| match facts.next() {
            Some(fact) if char_len(fact.trim()) >= FACT_MIN_CHARS => fact,
            _ => self.filler_fact.to_string(),
        })
    }
}

/// Cut an over-long summary to exactly the maximum, ending in `...`.
fn truncate_summary(summary: String) -> String {
    if char_len(&summary) <= SUMMARY_MAX_CHARS {
        return summary;
    }
    let keep = SUMMARY_MAX_CHARS - ELLIPSIS.len();
    let cut = summary
        .char_indices()
        .nth(keep)
        .map_or(summary.len(), |(idx, _)| idx);
    format!("{}{}", &summary[..cut], ELLIPSIS)
}

/// Check an already-built result without normalizing it.
///
/// Returns every violated rule. Used by the envelope check, where a
/// violation means an invariant was broken upstream.
pub fn validate_result(result: &AnalysisResult) -> Result<(), Vec<String>> {
    let mut violations = Vec::new();

    let len = char_len(result.summary());
    if !(SUMMARY_MIN_CHARS..=SUMMARY_MAX_CHARS).contains(&len) {
        violations.push(format!(
            "summary has {len} characters, expected {SUMMARY_MIN_CHARS}..={SUMMARY_MAX_CHARS}"
        ));
    }
    for (i, fact) in result.cool_facts().iter().enumerate() {
        let len = char_len(fact);
        if len < FACT_MIN_CHARS {
            violations.push(format!(
                "cool fact {i} has {len} characters, minimum is {FACT_MIN_CHARS}"
            ));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FILLER: &str = "Filler fact with enough characters";

    fn validator() -> SchemaValidator {
        SchemaValidator::new(FILLER)
    }

    fn candidate(summary: &str, facts: &[&str]) -> CandidateResult {
        CandidateResult::new(
            Some(summary.to_string()),
            facts.iter().map(|f| f.to_string()).collect(),
        )
    }

    #[test]
    fn exact_candidate_passes_unchanged() {
        let c = candidate(
            "A tool that caches HTTP responses.",
            &["first valid fact", "second valid fact", "third valid fact"],
        );
        let result = validator().validate(c).unwrap();
        assert_eq!(result.summary(), "A tool that caches HTTP responses.");
        assert_eq!(result.cool_facts()[1], "second valid fact");
    }

    #[test]
    fn extra_facts_truncated_in_order() {
        let facts = ["fact number 1", "fact number 2", "fact number 3", "fact number 4", "fact number 5"];
        let result = validator().validate(candidate("A long enough summary.", &facts)).unwrap();
        assert_eq!(result.cool_facts(), &["fact number 1", "fact number 2", "fact number 3"]);
    }

    #[test]
    fn missing_facts_padded() {
        let result = validator()
            .validate(candidate("A long enough summary.", &["the only fact given"]))
            .unwrap();
        assert_eq!(result.cool_facts()[0], "the only fact given");
        assert_eq!(result.cool_facts()[1], FILLER);
        assert_eq!(result.cool_facts()[2], FILLER);
    }

    #[test]
    fn short_fact_replaced_in_place() {
        let facts = ["first valid fact", "tiny", "third valid fact"];
        let result = validator().validate(candidate("A long enough summary.", &facts)).unwrap();
        assert_eq!(result.cool_facts(), &["first valid fact", FILLER, "third valid fact"]);
    }

    #[test]
    fn whitespace_padded_fact_counts_trimmed_length() {
        let facts = ["   short   ", "second valid fact", "third valid fact"];
        let result = validator().validate(candidate("A long enough summary.", &facts)).unwrap();
        assert_eq!(result.cool_facts()[0], FILLER);
    }

    #[test]
    fn valid_padded_fact_kept_verbatim() {
        let facts = ["  first valid fact \n", "second valid fact", "third valid fact"];
        let result = validator().validate(candidate("A long enough summary.", &facts)).unwrap();
        assert_eq!(result.cool_facts()[0], "  first valid fact \n");
        assert_eq!(validate_result(&result), Ok(()));
    }

    #[test]
    fn missing_summary_rejected_with_normalized_facts() {
        let c = CandidateResult::new(None, vec!["only one valid fact".into()]);
        let err = validator().validate(c).unwrap_err();
        assert_eq!(err.field, RejectedField::Summary);
        assert_eq!(err.normalized_facts[0], "only one valid fact");
        assert_eq!(err.normalized_facts[2], FILLER);
    }

    #[test]
    fn short_summary_rejected() {
        let err = validator().validate(candidate("Too short", &[])).unwrap_err();
        assert!(err.reason.contains("9 characters"));
    }

    #[test]
    fn ten_character_summary_accepted() {
        assert!(validator().validate(candidate("0123456789", &[])).is_ok());
    }

    #[test]
    fn long_summary_truncated_to_max() {
        let summary = "word ".repeat(200);
        let result = validator().validate(candidate(&summary, &[])).unwrap();
        assert_eq!(char_len(result.summary()), SUMMARY_MAX_CHARS);
        assert!(result.summary().ends_with("..."));
    }

    #[test]
    fn long_multibyte_summary_truncated_on_char_boundary() {
        let summary = "é".repeat(800);
        let result = validator().validate(candidate(&summary, &[])).unwrap();
        assert_eq!(char_len(result.summary()), SUMMARY_MAX_CHARS);
    }

    #[test]
    fn validate_result_reports_each_violation() {
        let result = AnalysisResult::from_parts(
            "short".into(),
            ["ok fact number one".into(), "bad".into(), "bad".into()],
        );
        let violations = validate_result(&result).unwrap_err();
        assert_eq!(violations.len(), 3);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]
        #[test]
        fn accepted_results_always_conform(
            summary in prop::option::of(".{0,700}"),
            facts in prop::collection::vec(".{0,40}", 0..8),
        ) {
            if let Ok(result) = validator().validate(CandidateResult::new(summary, facts)) {
                prop_assert_eq!(validate_result(&result), Ok(()));
            }
        }

        #[test]
        fn rejection_facts_always_conform(facts in prop::collection::vec(".{0,40}", 0..8)) {
            let err = validator().validate(CandidateResult::new(None, facts)).unwrap_err();
            for fact in &err.normalized_facts {
                prop_assert!(char_len(fact) >= FACT_MIN_CHARS);
            }
        }
    }
}
