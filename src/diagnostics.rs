//! Per-run diagnostics for README analysis.
//!
//! [`AnalysisReport`] records what happened during one analysis: which
//! strategy and backend ran, whether the model's output survived validation,
//! and, if not, which stage failed and why.

use serde::Serialize;

use crate::error::AnalysisError;
use crate::output_strategy::OutputStrategy;

/// The pipeline stage whose failure triggered fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Invocation,
    Parsing,
    Validation,
}

impl FailureStage {
    pub(crate) fn of(error: &AnalysisError) -> Self {
        match error {
            AnalysisError::Invocation(_) => FailureStage::Invocation,
            AnalysisError::Parse(_) => FailureStage::Parsing,
            AnalysisError::Rejected(_) => FailureStage::Validation,
        }
    }
}

/// How the returned result was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// The model's output passed validation (possibly after normalization).
    Validated,
    /// Canned output was used.
    Fallback {
        stage: FailureStage,
        reason: String,
        /// Whether the validator's normalized facts were kept.
        kept_facts: bool,
    },
}

/// Records what happened during one analysis.
///
/// # Example
///
/// ```
/// use readme_digest::diagnostics::{AnalysisReport, Outcome};
/// use readme_digest::OutputStrategy;
///
/// let report = AnalysisReport::new(OutputStrategy::LineFormat, "mock");
/// assert!(report.ok());
/// assert_eq!(report.outcome, Outcome::Validated);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub strategy: OutputStrategy,

    /// [`Backend::name`](crate::backend::Backend::name) of the backend used.
    pub backend: &'static str,

    pub outcome: Outcome,

    /// Characters of raw model output. `None` if the model was never heard
    /// from.
    pub raw_output_chars: Option<usize>,

    /// Whether the validator changed the facts (padding, truncation or
    /// replacement) or truncated the summary.
    pub normalized: bool,

    pub elapsed_ms: u64,
}

impl AnalysisReport {
    pub fn new(strategy: OutputStrategy, backend: &'static str) -> Self {
        Self {
            strategy,
            backend,
            outcome: Outcome::Validated,
            raw_output_chars: None,
            normalized: false,
            elapsed_ms: 0,
        }
    }

    /// Did the model's own output make it into the result?
    pub fn ok(&self) -> bool {
        self.outcome == Outcome::Validated
    }

    /// The absorbed error message, if fallback was used.
    pub fn fallback_reason(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Validated => None,
            Outcome::Fallback { reason, .. } => Some(reason),
        }
    }

    pub(crate) fn record_fallback(&mut self, error: &AnalysisError, kept_facts: bool) {
        self.outcome = Outcome::Fallback {
            stage: FailureStage::of(error),
            reason: error.to_string(),
            kept_facts,
        };
    }
}
