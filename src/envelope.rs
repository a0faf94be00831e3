//! Response envelope assembly and the repository boundary types.
//!
//! The HTTP layer that fetches READMEs and serves responses lives outside
//! this crate. What it needs from here:
//!
//! - [`RepositoryInfo::from_github_url`] to turn a user-supplied link into
//!   owner/repo, rejecting malformed references with [`InputError`]
//! - [`ResponseAssembler`] to fold a repository and an analysis into a
//!   checked [`ResponseEnvelope`]
//! - the `success: false` constructors for input, fetch and internal errors
//!
//! Successful envelopes serialize as:
//!
//! ```json
//! { "success": true,
//!   "data": { "repository": { "url", "owner", "repo", "readmeUrl" },
//!             "analysis": { "summary", "coolFacts": [..3] },
//!             "timestamp": "2024-05-01T12:00:00.000Z" } }
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::error;
use url::Url;

use crate::error::{EnvelopeValidationError, InputError, UpstreamFetchError};
use crate::types::AnalysisResult;
use crate::validator::validate_result;

const GITHUB_MARKER: &str = "github.com";

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch README from GitHub";
pub const INTERNAL_ERROR_MESSAGE: &str = "Failed to generate valid response";

/// The repository a README was taken from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryInfo {
    pub url: String,
    pub owner: String,
    pub repo: String,
    pub readme_url: String,
}

impl RepositoryInfo {
    pub fn new(
        url: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        readme_url: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            owner: owner.into(),
            repo: repo.into(),
            readme_url: readme_url.into(),
        }
    }

    /// Parse a GitHub repository link.
    ///
    /// Owner and repo are the first two path segments after `github.com/`.
    /// A `#fragment` or `?query` attached to the repo segment is dropped.
    ///
    /// ```
    /// use readme_digest::RepositoryInfo;
    ///
    /// let info = RepositoryInfo::from_github_url(
    ///     "https://github.com/tokio-rs/axum#readme",
    ///     "https://github.com/tokio-rs/axum/blob/main/README.md",
    /// ).unwrap();
    /// assert_eq!(info.owner, "tokio-rs");
    /// assert_eq!(info.repo, "axum");
    /// ```
    ///
    /// # Errors
    ///
    /// - [`InputError::NotGitHub`] if the link does not mention `github.com`
    /// - [`InputError::MissingOwnerOrRepo`] if either segment is empty
    /// - [`InputError::Malformed`] if the link is not an absolute URL
    pub fn from_github_url(
        url: &str,
        readme_url: impl Into<String>,
    ) -> Result<Self, InputError> {
        let url = url.trim();
        if !url.contains(GITHUB_MARKER) {
            return Err(InputError::NotGitHub);
        }

        let path = url
            .split_once("github.com/")
            .map(|(_, rest)| rest)
            .ok_or(InputError::MissingOwnerOrRepo)?;
        let mut segments = path.split('/');
        let owner = segments.next().unwrap_or_default();
        let repo = segments
            .next()
            .and_then(|s| s.split(['#', '?']).next())
            .unwrap_or_default();

        if owner.is_empty() || repo.is_empty() {
            return Err(InputError::MissingOwnerOrRepo);
        }

        Url::parse(url).map_err(|e| InputError::Malformed(e.to_string()))?;

        Ok(Self::new(url, owner, repo, readme_url))
    }

    fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        for (name, value) in [
            ("repository.url", &self.url),
            ("repository.owner", &self.owner),
            ("repository.repo", &self.repo),
            ("repository.readmeUrl", &self.readme_url),
        ] {
            if value.trim().is_empty() {
                violations.push(format!("{name} is required"));
            }
        }
        for (name, value) in [
            ("repository.url", &self.url),
            ("repository.readmeUrl", &self.readme_url),
        ] {
            if !value.trim().is_empty() {
                if let Err(e) = Url::parse(value) {
                    violations.push(format!("{name} must be a valid URL ({e})"));
                }
            }
        }
        violations
    }
}

/// Payload of a successful envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeData {
    pub repository: RepositoryInfo,
    pub analysis: AnalysisResult,
    #[serde(with = "millis_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// What the HTTP layer returns to the client.
///
/// `success == true` implies `data` is present and passed the final check;
/// `success == false` implies `data` is absent and `message` is present.
/// Deserialization enforces both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEnvelope")]
pub struct ResponseEnvelope {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EnvelopeData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Upstream detail for fetch failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Individual violations for internal errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct RawEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<EnvelopeData>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    errors: Option<Vec<String>>,
}

impl TryFrom<RawEnvelope> for ResponseEnvelope {
    type Error = &'static str;

    fn try_from(raw: RawEnvelope) -> Result<Self, Self::Error> {
        match (raw.success, raw.data.is_some(), raw.message.is_some()) {
            (true, false, _) => return Err("successful envelope is missing data"),
            (false, true, _) => return Err("failed envelope must not carry data"),
            (false, _, false) => return Err("failed envelope is missing message"),
            _ => {}
        }
        Ok(Self {
            success: raw.success,
            data: raw.data,
            message: raw.message,
            error: raw.error,
            errors: raw.errors,
        })
    }
}

impl ResponseEnvelope {
    fn succeeded(data: EnvelopeData) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
            errors: None,
        }
    }

    /// A `success: false` envelope carrying `message`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            error: None,
            errors: None,
        }
    }

    /// The envelope for a failed final check. Maps to an internal error at
    /// the HTTP layer.
    pub fn internal_error() -> Self {
        Self::failure(INTERNAL_ERROR_MESSAGE)
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl From<InputError> for ResponseEnvelope {
    fn from(err: InputError) -> Self {
        Self::failure(err.to_string())
    }
}

impl From<UpstreamFetchError> for ResponseEnvelope {
    fn from(err: UpstreamFetchError) -> Self {
        Self {
            error: Some(err.0),
            ..Self::failure(FETCH_FAILED_MESSAGE)
        }
    }
}

impl From<EnvelopeValidationError> for ResponseEnvelope {
    fn from(err: EnvelopeValidationError) -> Self {
        Self {
            errors: Some(err.violations),
            ..Self::internal_error()
        }
    }
}

/// Builds and checks success envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseAssembler;

impl ResponseAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Assemble an envelope stamped with the current time.
    pub fn assemble(
        &self,
        repository: RepositoryInfo,
        analysis: AnalysisResult,
    ) -> Result<ResponseEnvelope, EnvelopeValidationError> {
        self.assemble_at(repository, analysis, Utc::now())
    }

    /// Assemble an envelope with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// [`EnvelopeValidationError`] listing every violation if a repository
    /// field is empty, a URL does not parse, or the analysis breaks the
    /// result invariants.
    pub fn assemble_at(
        &self,
        repository: RepositoryInfo,
        analysis: AnalysisResult,
        timestamp: DateTime<Utc>,
    ) -> Result<ResponseEnvelope, EnvelopeValidationError> {
        let mut violations = repository.violations();
        if let Err(analysis_violations) = validate_result(&analysis) {
            violations.extend(
                analysis_violations
                    .into_iter()
                    .map(|v| format!("analysis.{v}")),
            );
        }

        if !violations.is_empty() {
            error!(
                owner = %repository.owner,
                repo = %repository.repo,
                violations = ?violations,
                "response envelope failed validation"
            );
            return Err(EnvelopeValidationError { violations });
        }

        Ok(ResponseEnvelope::succeeded(EnvelopeData {
            repository,
            analysis,
            timestamp,
        }))
    }
}

/// ISO-8601 UTC with millisecond precision and a `Z` suffix.
mod millis_timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::FallbackSynthesizer;
    use crate::output_strategy::OutputStrategy;
    use chrono::TimeZone;

    fn repo() -> RepositoryInfo {
        RepositoryInfo::new(
            "https://github.com/tokio-rs/axum",
            "tokio-rs",
            "axum",
            "https://github.com/tokio-rs/axum/blob/main/README.md",
        )
    }

    fn analysis() -> AnalysisResult {
        FallbackSynthesizer::for_strategy(OutputStrategy::LineFormat).synthesize()
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 5).unwrap()
    }

    #[test]
    fn test_from_github_url_plain() {
        let info = RepositoryInfo::from_github_url("https://github.com/serde-rs/serde", "https://x.test/r").unwrap();
        assert_eq!(info.owner, "serde-rs");
        assert_eq!(info.repo, "serde");
        assert_eq!(info.url, "https://github.com/serde-rs/serde");
        assert_eq!(info.readme_url, "https://x.test/r");
    }

    #[test]
    fn test_from_github_url_strips_fragment_query_and_tail() {
        for url in [
            "https://github.com/serde-rs/serde#readme",
            "https://github.com/serde-rs/serde?tab=readme",
            "https://github.com/serde-rs/serde/tree/master/serde_derive",
            "https://github.com/serde-rs/serde/",
        ] {
            let info = RepositoryInfo::from_github_url(url, "https://x.test/r").unwrap();
            assert_eq!((info.owner.as_str(), info.repo.as_str()), ("serde-rs", "serde"), "{url}");
        }
    }

    #[test]
    fn test_from_github_url_rejections() {
        assert_eq!(
            RepositoryInfo::from_github_url("https://gitlab.com/a/b", ""),
            Err(InputError::NotGitHub)
        );
        for url in ["https://github.com/", "https://github.com/owner", "https://github.com/owner/", "https://github.com//repo", "github.com"] {
            assert_eq!(
                RepositoryInfo::from_github_url(url, ""),
                Err(InputError::MissingOwnerOrRepo),
                "{url}"
            );
        }
        assert!(matches!(
            RepositoryInfo::from_github_url("github.com/owner/repo", ""),
            Err(InputError::Malformed(_))
        ));
    }

    #[test]
    fn test_assemble_success_shape() {
        let envelope = ResponseAssembler::new()
            .assemble_at(repo(), analysis(), fixed_time())
            .unwrap();
        assert!(envelope.is_success());

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("message").is_none());
        assert_eq!(json["data"]["repository"]["readmeUrl"], "https://github.com/tokio-rs/axum/blob/main/README.md");
        assert_eq!(json["data"]["analysis"]["coolFacts"].as_array().unwrap().len(), 3);
        assert_eq!(json["data"]["timestamp"], "2024-05-01T12:30:05.000Z");
    }

    #[test]
    fn test_envelope_deserializes_back() {
        let envelope = ResponseAssembler::new()
            .assemble_at(repo(), analysis(), fixed_time())
            .unwrap();
        let text = serde_json::to_string(&envelope).unwrap();
        let back: ResponseEnvelope = serde_json::from_str(&text).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn test_failure_envelope_deserializes_back() {
        let envelope = ResponseEnvelope::from(UpstreamFetchError("404 Not Found".into()));
        let text = serde_json::to_string(&envelope).unwrap();
        let back: ResponseEnvelope = serde_json::from_str(&text).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn test_inconsistent_envelopes_rejected() {
        let err = serde_json::from_str::<ResponseEnvelope>(r#"{"success": true}"#).unwrap_err();
        assert!(err.to_string().contains("missing data"), "{err}");

        let err = serde_json::from_str::<ResponseEnvelope>(r#"{"success": false}"#).unwrap_err();
        assert!(err.to_string().contains("missing message"), "{err}");

        let mut json = serde_json::to_value(
            ResponseAssembler::new()
                .assemble_at(repo(), analysis(), fixed_time())
                .unwrap(),
        )
        .unwrap();
        json["success"] = serde_json::Value::Bool(false);
        json["message"] = serde_json::Value::from("oops");
        assert!(serde_json::from_value::<ResponseEnvelope>(json).is_err());
    }

    #[test]
    fn test_envelope_with_short_analysis_rejected() {
        let json = serde_json::json!({
            "success": true,
            "data": {
                "repository": repo(),
                "analysis": {"summary": "x", "coolFacts": ["a", "b", "c"]},
                "timestamp": "2024-05-01T12:30:05.000Z"
            }
        });
        assert!(serde_json::from_value::<ResponseEnvelope>(json).is_err());
    }

    #[test]
    fn test_assemble_collects_repository_violations() {
        let bad = RepositoryInfo::new("not a url", "", "axum", "");
        let err = ResponseAssembler::new().assemble_at(bad, analysis(), fixed_time()).unwrap_err();
        assert_eq!(err.violations.len(), 3, "{:?}", err.violations);
        assert!(err.violations.iter().any(|v| v.starts_with("repository.owner")));
        assert!(err.violations.iter().any(|v| v.starts_with("repository.url must be a valid URL")));
    }

    #[test]
    fn test_assemble_rejects_nonconformant_analysis() {
        let broken = AnalysisResult::from_parts("short".into(), ["x".into(), "y".into(), "z".into()]);
        let err = ResponseAssembler::new().assemble_at(repo(), broken, fixed_time()).unwrap_err();
        assert!(err.violations.iter().all(|v| v.starts_with("analysis.")));
        assert_eq!(err.violations.len(), 4);
    }

    #[test]
    fn test_failure_shapes() {
        let json = serde_json::to_value(ResponseEnvelope::from(InputError::NotGitHub)).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "message": "Invalid GitHub URL"}));

        let json = serde_json::to_value(ResponseEnvelope::from(UpstreamFetchError("404 Not Found".into()))).unwrap();
        assert_eq!(json["message"], FETCH_FAILED_MESSAGE);
        assert_eq!(json["error"], "404 Not Found");
        assert!(json.get("data").is_none());

        let envelope = ResponseEnvelope::from(EnvelopeValidationError { violations: vec!["a".into()] });
        assert!(!envelope.success);
        assert_eq!(envelope.message.as_deref(), Some(INTERNAL_ERROR_MESSAGE));
        assert_eq!(envelope.errors, Some(vec!["a".to_string()]));
    }
}
