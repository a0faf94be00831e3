//! The README analysis pipeline.
//!
//! [`ReadmeAnalyzer`] owns one configured instance of each stage and drives
//! a single analysis through them:
//!
//! ```text
//! Prompting → Invoking → Parsing → Validating → Validated ─┐
//!                 │          │          │                  ├→ Assembling → Done
//!                 └──────────┴──────────┴→ FallbackApplied ┘        └─→ EnvelopeInvalid
//! ```
//!
//! Invocation, parse and validation failures are absorbed: the analyzer logs
//! them, reports them, and returns canned output. Only the final envelope
//! check can fail.

use std::sync::{atomic::AtomicBool, Arc};
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::{Backend, OpenAiBackend};
use crate::config::{InvocationMode, LlmConfig, DEFAULT_TIMEOUT};
use crate::diagnostics::AnalysisReport;
use crate::envelope::{RepositoryInfo, ResponseAssembler, ResponseEnvelope};
use crate::error::{AnalysisError, EnvelopeValidationError, InvocationError};
use crate::events::{emit, Event, EventHandler};
use crate::fallback::{FallbackPolicy, FallbackSynthesizer};
use crate::invoker::ModelInvoker;
use crate::output_strategy::OutputStrategy;
use crate::prompt::PromptBuilder;
use crate::types::{char_len, AnalysisResult, CandidateResult};
use crate::validator::SchemaValidator;

/// Where a single analysis currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Prompting,
    Invoking,
    Parsing,
    Validating,
    Validated,
    FallbackApplied,
    Assembling,
    Done,
    EnvelopeInvalid,
}

impl PipelineState {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Prompting => "prompting",
            PipelineState::Invoking => "invoking",
            PipelineState::Parsing => "parsing",
            PipelineState::Validating => "validating",
            PipelineState::Validated => "validated",
            PipelineState::FallbackApplied => "fallback_applied",
            PipelineState::Assembling => "assembling",
            PipelineState::Done => "done",
            PipelineState::EnvelopeInvalid => "envelope_invalid",
        }
    }

    /// No transition leaves this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::EnvelopeInvalid)
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Turns README text into a conformant [`AnalysisResult`].
///
/// Holds no per-run state, so one analyzer can serve concurrent tasks
/// behind an `Arc`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use readme_digest::{backend::MockBackend, ReadmeAnalyzer};
///
/// # tokio_test::block_on(async {
/// let analyzer = ReadmeAnalyzer::builder("http://unused")
///     .backend(Arc::new(MockBackend::fixed(
///         "Summary: A tiny HTTP router for embedded targets.\n\
///          Cool fact: Routes are matched with a compile-time radix tree.\n\
///          Cool fact: Runs without an allocator on no_std targets.\n\
///          Cool fact: Supports HTTP/1.1 pipelining over a single socket.",
///     )))
///     .build()
///     .unwrap();
///
/// let result = analyzer.analyze("# tiny-router\n...").await;
/// assert_eq!(result.summary(), "A tiny HTTP router for embedded targets.");
/// assert_eq!(result.cool_facts().len(), 3);
/// # });
/// ```
pub struct ReadmeAnalyzer {
    strategy: OutputStrategy,
    prompt: PromptBuilder,
    invoker: ModelInvoker,
    validator: SchemaValidator,
    fallback: FallbackSynthesizer,
    policy: FallbackPolicy,
    assembler: ResponseAssembler,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl ReadmeAnalyzer {
    /// Create a new builder.
    pub fn builder(base_url: impl Into<String>) -> ReadmeAnalyzerBuilder {
        ReadmeAnalyzerBuilder {
            client: None,
            base_url: base_url.into(),
            backend: None,
            config: LlmConfig::default(),
            strategy: OutputStrategy::default(),
            mode: InvocationMode::default(),
            timeout: None,
            policy: FallbackPolicy::default(),
            cancellation: None,
            event_handler: None,
        }
    }

    pub fn strategy(&self) -> OutputStrategy {
        self.strategy
    }

    pub fn fallback(&self) -> &FallbackSynthesizer {
        &self.fallback
    }

    /// Analyze `readme`. Never fails; degraded runs return canned output.
    pub async fn analyze(&self, readme: &str) -> AnalysisResult {
        self.analyze_with_report(readme).await.0
    }

    /// Analyze `readme` and describe how the result was produced.
    pub async fn analyze_with_report(&self, readme: &str) -> (AnalysisResult, AnalysisReport) {
        let started = Instant::now();
        let mut report = AnalysisReport::new(self.strategy, self.invoker.backend_name());

        self.enter(PipelineState::Prompting);
        let prompt = self.prompt.build(readme);

        let result = match self.extract(&prompt, &mut report).await {
            Ok(result) => {
                self.enter(PipelineState::Validated);
                result
            }
            Err(err) => self.fall_back(err, &mut report),
        };

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            strategy = self.strategy.name(),
            backend = report.backend,
            validated = report.ok(),
            elapsed_ms = report.elapsed_ms,
            "readme analyzed"
        );
        emit(
            &self.event_handler,
            Event::Done {
                validated: report.ok(),
                elapsed_ms: report.elapsed_ms,
            },
        );

        (result, report)
    }

    /// Analyze `readme` and wrap the result in a checked envelope.
    ///
    /// # Errors
    ///
    /// [`EnvelopeValidationError`] if the assembled envelope breaks its
    /// invariants. Map it to [`ResponseEnvelope::internal_error`].
    pub async fn analyze_repository(
        &self,
        repository: RepositoryInfo,
        readme: &str,
    ) -> Result<ResponseEnvelope, EnvelopeValidationError> {
        let analysis = self.analyze(readme).await;

        self.enter(PipelineState::Assembling);
        match self.assembler.assemble(repository, analysis) {
            Ok(envelope) => {
                self.enter(PipelineState::Done);
                Ok(envelope)
            }
            Err(err) => {
                self.enter(PipelineState::EnvelopeInvalid);
                Err(err)
            }
        }
    }

    /// Invoking through Validating. Any error here means fallback.
    async fn extract(
        &self,
        prompt: &str,
        report: &mut AnalysisReport,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.enter(PipelineState::Invoking);
        let raw = self.invoker.invoke(prompt).await?;
        report.raw_output_chars = Some(char_len(&raw));

        self.enter(PipelineState::Parsing);
        let candidate = self.strategy.parse(&raw)?;
        debug!(
            strategy = self.strategy.name(),
            has_summary = candidate.summary.is_some(),
            facts = candidate.cool_facts.len(),
            "parsed candidate"
        );

        self.enter(PipelineState::Validating);
        let before = comparable(&candidate);
        let result = self.validator.validate(candidate)?;
        report.normalized = !same_text(&before, &result);
        Ok(result)
    }

    fn fall_back(&self, err: AnalysisError, report: &mut AnalysisReport) -> AnalysisResult {
        let kept_facts = match (&err, self.policy) {
            (AnalysisError::Rejected(rejection), FallbackPolicy::KeepFacts) => {
                Some(rejection.normalized_facts.clone())
            }
            _ => None,
        };

        warn!(
            strategy = self.strategy.name(),
            reason = %err,
            keep_facts = kept_facts.is_some(),
            "falling back to canned analysis"
        );
        report.record_fallback(&err, kept_facts.is_some());

        self.enter(PipelineState::FallbackApplied);
        emit(
            &self.event_handler,
            Event::FallbackApplied {
                reason: err.to_string(),
            },
        );

        match kept_facts {
            Some(facts) => self.fallback.with_facts(facts),
            None => self.fallback.synthesize(),
        }
    }

    fn enter(&self, state: PipelineState) {
        debug!(strategy = self.strategy.name(), state = state.name(), "pipeline state");
        emit(&self.event_handler, Event::StateChanged { state });
    }
}

/// Summary trimmed the way the validator trims it; facts as parsed.
fn comparable(candidate: &CandidateResult) -> (Option<String>, Vec<String>) {
    (
        candidate.summary.as_deref().map(|s| s.trim().to_string()),
        candidate.cool_facts.clone(),
    )
}

fn same_text(before: &(Option<String>, Vec<String>), result: &AnalysisResult) -> bool {
    before.0.as_deref() == Some(result.summary()) && before.1.as_slice() == result.cool_facts().as_slice()
}

impl std::fmt::Debug for ReadmeAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadmeAnalyzer")
            .field("strategy", &self.strategy)
            .field("policy", &self.policy)
            .field("invoker", &self.invoker)
            .finish()
    }
}

/// Builder for [`ReadmeAnalyzer`].
pub struct ReadmeAnalyzerBuilder {
    client: Option<Client>,
    base_url: String,
    backend: Option<Arc<dyn Backend>>,
    config: LlmConfig,
    strategy: OutputStrategy,
    mode: InvocationMode,
    timeout: Option<Duration>,
    policy: FallbackPolicy,
    cancellation: Option<Arc<AtomicBool>>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl ReadmeAnalyzerBuilder {
    /// Set the HTTP client. If not set, a default client is created.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the backend. Default: [`OpenAiBackend`] without a key.
    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Use the OpenAI backend with `Authorization: Bearer {key}`.
    pub fn openai_with_key(mut self, api_key: impl Into<String>) -> Self {
        self.backend = Some(Arc::new(OpenAiBackend::new().with_api_key(api_key)));
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config = self.config.with_model(model);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config = self.config.with_max_tokens(tokens);
        self
    }

    /// Output strategy. Also selects prompt instructions and fallback text.
    pub fn strategy(mut self, strategy: OutputStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn mode(mut self, mode: InvocationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Shorthand for [`InvocationMode::Streaming`].
    pub fn streaming(self, enabled: bool) -> Self {
        self.mode(if enabled {
            InvocationMode::Streaming
        } else {
            InvocationMode::SingleShot
        })
    }

    /// Bound on each model call. Default: 60 seconds.
    ///
    /// Also used as the HTTP client timeout unless a custom client is set.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn cancellation(mut self, cancel: Option<Arc<AtomicBool>>) -> Self {
        self.cancellation = cancel;
        self
    }

    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Build the analyzer.
    ///
    /// # Errors
    ///
    /// [`InvocationError::Request`] if the default HTTP client cannot be
    /// constructed.
    pub fn build(self) -> Result<ReadmeAnalyzer, InvocationError> {
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = match self.client {
            Some(client) => client,
            None => Client::builder().timeout(timeout).build()?,
        };
        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(OpenAiBackend::new()));
        let config = self.config.with_json_mode(self.strategy.wants_json());

        let invoker = ModelInvoker::new(client, normalize_base_url(&self.base_url), backend)
            .with_config(config)
            .with_mode(self.mode)
            .with_timeout(timeout)
            .with_cancellation(self.cancellation)
            .with_event_handler(self.event_handler.clone());

        let fallback = FallbackSynthesizer::for_strategy(self.strategy);

        Ok(ReadmeAnalyzer {
            strategy: self.strategy,
            prompt: PromptBuilder::new(self.strategy),
            invoker,
            validator: SchemaValidator::new(fallback.filler_fact()),
            fallback,
            policy: self.policy,
            assembler: ResponseAssembler::new(),
            event_handler: self.event_handler,
        })
    }
}

/// Strip known provider path suffixes from a base URL, since backends
/// append their own paths.
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    // longest first
    for suffix in [
        "/v1/chat/completions",
        "/v1/chat",
        "/v1",
        "/api/generate",
        "/api/chat",
        "/api",
    ] {
        if let Some(stripped) = trimmed.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    trimmed.to_string()
}
