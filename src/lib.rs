//! # README Digest
//!
//! Turns an unstructured repository README into a fixed-shape analysis: a
//! summary of 10 to 500 characters plus exactly three technical facts of at
//! least 10 characters each.
//!
//! Model output is treated as untrusted. Every run ends in a conformant
//! [`AnalysisResult`]: when the model fails, times out, or answers in a shape
//! that cannot be repaired, canned fallback text is returned instead.
//!
//! ## Core Concepts
//!
//! - **[`ReadmeAnalyzer`]**: the pipeline. Prompt, invoke, parse, validate,
//!   fall back, and optionally assemble a [`ResponseEnvelope`].
//! - **[`OutputStrategy`]**: how the model is asked to answer and how its
//!   answer is read. `LineFormat` (`Summary:` / `Cool fact:` lines, the
//!   default) or `SchemaGuided` (a JSON object).
//! - **[`Backend`](backend::Backend)**: the provider seam. OpenAI chat
//!   completions, Ollama `/api/generate`, or [`MockBackend`] in tests.
//! - **[`SchemaValidator`]** and **[`FallbackSynthesizer`]**: normalization
//!   and degraded-mode output.
//! - **[`events`]** and **[`diagnostics`]**: what happened during a run.
//!
//! ## Quick Start
//!
//! ```no_run
//! use readme_digest::{AnalyzerSettings, RepositoryInfo};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let analyzer = AnalyzerSettings::from_env()?.into_builder().build()?;
//!
//!     let repo = RepositoryInfo::from_github_url(
//!         "https://github.com/tokio-rs/axum",
//!         "https://github.com/tokio-rs/axum/blob/main/README.md",
//!     )?;
//!     let envelope = analyzer.analyze_repository(repo, "# axum\n...").await?;
//!     println!("{}", serde_json::to_string_pretty(&envelope)?);
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod backend;
pub mod config;
pub mod diagnostics;
pub mod envelope;
pub mod error;
pub mod events;
pub mod fallback;
pub mod invoker;
pub mod output_parser;
pub mod output_strategy;
pub mod prompt;
pub mod streaming;
pub mod types;
pub mod validator;

pub use analyzer::{PipelineState, ReadmeAnalyzer, ReadmeAnalyzerBuilder};
pub use backend::{MockBackend, OllamaBackend, OpenAiBackend};
pub use config::{AnalyzerSettings, InvocationMode, LlmConfig, Provider};
pub use diagnostics::{AnalysisReport, Outcome};
pub use envelope::{EnvelopeData, RepositoryInfo, ResponseAssembler, ResponseEnvelope};
pub use error::{
    AnalysisError, ConfigError, EnvelopeValidationError, InputError, InvocationError,
    UpstreamFetchError, ValidationRejection,
};
pub use fallback::{FallbackPolicy, FallbackSynthesizer};
pub use invoker::ModelInvoker;
pub use output_parser::ParseError;
pub use output_strategy::OutputStrategy;
pub use prompt::PromptBuilder;
pub use types::{AnalysisResult, CandidateResult};
pub use validator::SchemaValidator;
