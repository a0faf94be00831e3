//! Mock backend for testing without a live model.
//!
//! [`MockBackend`] returns canned responses in order, or fails every call,
//! so analyzer behavior can be tested deterministically.
//!
//! # Example
//!
//! ```
//! use readme_digest::backend::MockBackend;
//!
//! let mock = MockBackend::fixed("Summary: A tiny HTTP router.");
//! let broken = MockBackend::failing("backend unavailable");
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{Backend, LlmRequest, LlmResponse};
use crate::error::{InvocationError, Result};

#[derive(Debug)]
enum Script {
    Responses(Vec<String>),
    Fail(String),
}

/// A test backend with scripted behavior.
///
/// Responses cycle when exhausted. In streaming mode each response is
/// emitted in chunks of `chunk_chars` characters (whole response if unset).
#[derive(Debug)]
pub struct MockBackend {
    script: Script,
    index: AtomicUsize,
    calls: AtomicUsize,
    chunk_chars: Option<usize>,
    delay: Option<Duration>,
}

impl MockBackend {
    /// Create a mock with canned responses, returned in order.
    pub fn new(responses: Vec<String>) -> Self {
        assert!(!responses.is_empty(), "MockBackend requires at least one response");
        Self::with_script(Script::Responses(responses))
    }

    /// Create a mock that always returns the same response.
    pub fn fixed(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// Create a mock whose every call fails with [`InvocationError::Other`].
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_script(Script::Fail(message.into()))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            index: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            chunk_chars: None,
            delay: None,
        }
    }

    /// Split streamed responses into chunks of this many characters.
    pub fn with_chunk_chars(mut self, chars: usize) -> Self {
        self.chunk_chars = Some(chars.max(1));
        self
    }

    /// Sleep before answering (for timeout tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    async fn next_response(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.script {
            Script::Responses(responses) => {
                let idx = self.index.fetch_add(1, Ordering::Relaxed) % responses.len();
                Ok(responses[idx].clone())
            }
            Script::Fail(message) => Err(InvocationError::Other(message.clone())),
        }
    }
}

fn split_chars(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

#[async_trait]
impl Backend for MockBackend {
    async fn complete(
        &self,
        _client: &Client,
        _base_url: &str,
        _request: &LlmRequest,
    ) -> Result<LlmResponse> {
        let text = self.next_response().await?;
        Ok(LlmResponse {
            text,
            status: 200,
            metadata: None,
        })
    }

    async fn complete_streaming(
        &self,
        _client: &Client,
        _base_url: &str,
        _request: &LlmRequest,
        on_chunk: &mut (dyn FnMut(String) + Send),
    ) -> Result<LlmResponse> {
        let text = self.next_response().await?;
        match self.chunk_chars {
            Some(size) => {
                for chunk in split_chars(&text, size) {
                    on_chunk(chunk);
                }
            }
            None => on_chunk(text.clone()),
        }
        Ok(LlmResponse {
            text,
            status: 200,
            metadata: None,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
