//! Line-format parsing: `Summary:` and `Cool fact:` markers.
//!
//! This strategy never fails. It hands whatever it found to the validator,
//! which owns count and length normalization. Lines are matched as written:
//! no think-tag stripping, no bullet or indent tolerance.

use crate::types::CandidateResult;

/// Marker for the summary line.
pub const SUMMARY_MARKER: &str = "Summary:";
/// Marker for each cool-fact line.
pub const FACT_MARKER: &str = "Cool fact:";

/// Scan model output line by line for the two markers.
///
/// A line counts only when it begins with the literal marker.
///
/// - The first `Summary:` line supplies the summary; later ones are ignored.
/// - Every `Cool fact:` line supplies one fact, in order, with no upper bound.
/// - Everything else is ignored.
///
/// Remainders are trimmed. An empty remainder still counts as a (too short)
/// value so the validator can replace it in position.
///
/// ```
/// use readme_digest::output_parser::parse_line_format;
///
/// let candidate = parse_line_format("Summary: A cache.\nCool fact: LRU eviction policy.");
/// assert_eq!(candidate.summary.as_deref(), Some("A cache."));
/// assert_eq!(candidate.cool_facts, vec!["LRU eviction policy."]);
/// ```
pub fn parse_line_format(response: &str) -> CandidateResult {
    let mut candidate = CandidateResult::default();

    for line in response.lines() {
        if let Some(rest) = line.strip_prefix(SUMMARY_MARKER) {
            if candidate.summary.is_none() {
                candidate.summary = Some(rest.trim().to_string());
            }
        } else if let Some(rest) = line.strip_prefix(FACT_MARKER) {
            candidate.cool_facts.push(rest.trim().to_string());
        }
    }

    candidate
}
