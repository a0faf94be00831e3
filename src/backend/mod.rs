//! Backend trait and normalized request/response types.
//!
//! The [`Backend`] trait abstracts over text-generation providers,
//! translating a normalized [`LlmRequest`] into provider-specific HTTP calls.
//! Built-in implementations: [`OpenAiBackend`], [`OllamaBackend`],
//! [`MockBackend`].
//!
//! ## Architecture
//!
//! ```text
//! ModelInvoker ──► LlmRequest ──► Backend::complete() ──► LlmResponse
//!                                        │
//!                             ┌──────────┴──────────┐
//!                        OpenAiBackend         OllamaBackend
//!                   /v1/chat/completions       /api/generate
//!                      SSE streaming         NDJSON streaming
//! ```
//!
//! Backends never retry. Every failure is returned as an
//! [`InvocationError`] and the analyzer falls back.

pub mod mock;
pub mod ollama;
pub mod openai;
pub mod sse;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

use crate::config::LlmConfig;
use crate::error::{InvocationError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;

/// A normalized, provider-agnostic generation request.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// The rendered prompt, sent as a single user message.
    pub prompt: String,

    /// Model, token limit and output mode.
    pub config: LlmConfig,

    /// Whether to use the streaming endpoint.
    pub stream: bool,
}

/// A normalized generation response.
#[derive(Debug)]
pub struct LlmResponse {
    /// The generated text content.
    pub text: String,

    /// HTTP status code (for diagnostics/logging).
    pub status: u16,

    /// Provider-specific metadata (token counts, timing, model info).
    pub metadata: Option<serde_json::Value>,
}

/// Abstraction over generation providers.
///
/// Implementors translate between [`LlmRequest`]/[`LlmResponse`] and the
/// provider's HTTP API, in single-shot and streaming mode.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn Backend>`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Execute a single-shot call.
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse>;

    /// Execute a streaming call.
    ///
    /// `on_chunk` receives each text chunk in arrival order. The returned
    /// response carries the provider's own accumulated text.
    async fn complete_streaming(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
        on_chunk: &mut (dyn FnMut(String) + Send),
    ) -> Result<LlmResponse>;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str;
}

/// Parse a `Retry-After` header value given in seconds.
pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Send a JSON POST and map connection failures.
pub(crate) async fn post_json(
    request: reqwest::RequestBuilder,
    url: &str,
) -> Result<Response> {
    let resp = request.send().await.map_err(|e| {
        InvocationError::Other(format!("Failed to connect to LLM at {}: {}", url, e))
    })?;
    check_status(resp).await
}

/// Turn a non-success response into the matching error.
///
/// 429 becomes [`InvocationError::RateLimited`]; everything else non-2xx
/// becomes [`InvocationError::Http`] with the body text.
pub(crate) async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    if status.as_u16() == 429 {
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        return Err(InvocationError::RateLimited { retry_after });
    }

    let body = resp.text().await.unwrap_or_default();
    Err(InvocationError::Http {
        status: status.as_u16(),
        body,
    })
}
