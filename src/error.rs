use std::time::Duration;
use thiserror::Error;

use crate::output_parser::ParseError;

/// Failure to obtain output from the generation backend.
///
/// Every transport, HTTP, rate-limit, timeout and stream failure collapses
/// into this one type. The analyzer absorbs it and falls back.
#[derive(Error, Debug)]
pub enum InvocationError {
    /// Low-level HTTP transport failure (connection refused, reset, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend response body could not be decoded.
    #[error("failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Non-success HTTP status with the response body.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code (e.g. 500, 503).
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The provider answered 429.
    ///
    /// `retry_after` is parsed from the `Retry-After` header when present.
    /// Retrying is left to the caller.
    #[error("rate limited by backend (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// The call did not finish within the configured timeout.
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    /// The cancellation flag was set before the call started.
    #[error("model call was cancelled")]
    Cancelled,

    /// Catch-all for backend-specific failures.
    #[error("{0}")]
    Other(String),
}

/// Which field made the validator reject a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectedField {
    Summary,
}

impl std::fmt::Display for RejectedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectedField::Summary => write!(f, "summary"),
        }
    }
}

/// A candidate the validator could not make conformant.
///
/// Carries the facts after count and length normalization so the caller can
/// reuse them together with a synthesized summary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("candidate rejected: {field} {reason}")]
pub struct ValidationRejection {
    pub field: RejectedField,
    pub reason: String,
    pub normalized_facts: [String; 3],
}

/// The assembled envelope failed its final structural check.
///
/// Reaching this means the validator or fallback produced something that
/// breaks the result invariants, which is a bug rather than a transient
/// condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("response envelope failed validation: {}", .violations.join("; "))]
pub struct EnvelopeValidationError {
    pub violations: Vec<String>,
}

/// Malformed repository reference supplied by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Invalid GitHub URL")]
    NotGitHub,

    #[error("Invalid GitHub repository URL format")]
    MissingOwnerOrRepo,

    #[error("Invalid URL: {0}")]
    Malformed(String),
}

/// The README could not be retrieved from the hosting service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to fetch README: {0}")]
pub struct UpstreamFetchError(pub String);

/// Errors absorbed inside the analysis pipeline.
///
/// `ReadmeAnalyzer::analyze` never returns these; they are recorded in the
/// analysis report and logged before the fallback result is used.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("model invocation failed: {0}")]
    Invocation(#[from] InvocationError),

    #[error("model output could not be parsed: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Rejected(#[from] ValidationRejection),
}

/// Invalid configuration read from the environment or a settings file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

pub type Result<T, E = InvocationError> = std::result::Result<T, E>;
