//! Model invocation with timeout, cancellation and stream accumulation.
//!
//! [`ModelInvoker`] sends one rendered prompt to its [`Backend`] and returns
//! the raw text. In streaming mode every chunk is appended, in arrival order,
//! to a buffer owned by the invocation; nothing partial leaves this module.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::{debug, warn};

use crate::backend::{Backend, LlmRequest};
use crate::config::{InvocationMode, LlmConfig};
use crate::error::{InvocationError, Result};
use crate::events::{emit, Event, EventHandler};

/// Calls a backend once per prompt. No retries.
pub struct ModelInvoker {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) config: LlmConfig,
    pub(crate) mode: InvocationMode,
    pub(crate) timeout: Duration,
    pub(crate) cancellation: Option<Arc<AtomicBool>>,
    pub(crate) event_handler: Option<Arc<dyn EventHandler>>,
}

impl ModelInvoker {
    pub fn new(client: Client, base_url: impl Into<String>, backend: Arc<dyn Backend>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            backend,
            config: LlmConfig::default(),
            mode: InvocationMode::default(),
            timeout: crate::config::DEFAULT_TIMEOUT,
            cancellation: None,
            event_handler: None,
        }
    }

    pub fn with_config(mut self, config: LlmConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_mode(mut self, mode: InvocationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancellation(mut self, flag: Option<Arc<AtomicBool>>) -> Self {
        self.cancellation = flag;
        self
    }

    pub fn with_event_handler(mut self, handler: Option<Arc<dyn EventHandler>>) -> Self {
        self.event_handler = handler;
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn mode(&self) -> InvocationMode {
        self.mode
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }

    /// Send `prompt` to the model and return its complete output.
    ///
    /// # Errors
    ///
    /// - [`InvocationError::Cancelled`] if the cancellation flag is set
    /// - [`InvocationError::Timeout`] if the call outlives the timeout
    /// - any transport, HTTP or decode error from the backend
    pub async fn invoke(&self, prompt: &str) -> Result<String> {
        if self.is_cancelled() {
            return Err(InvocationError::Cancelled);
        }

        let request = LlmRequest {
            prompt: prompt.to_string(),
            config: self.config.clone(),
            stream: self.mode == InvocationMode::Streaming,
        };

        let started = Instant::now();
        let outcome = match self.mode {
            InvocationMode::SingleShot => {
                tokio::time::timeout(self.timeout, self.single_shot(&request)).await
            }
            InvocationMode::Streaming => {
                tokio::time::timeout(self.timeout, self.streamed(&request)).await
            }
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(text)) => {
                debug!(
                    backend = self.backend.name(),
                    model = %self.config.model,
                    chars = text.chars().count(),
                    elapsed_ms,
                    "model call finished"
                );
                Ok(text)
            }
            Ok(Err(err)) => {
                warn!(backend = self.backend.name(), reason = %err, elapsed_ms, "model call failed");
                Err(err)
            }
            Err(_) => {
                warn!(backend = self.backend.name(), elapsed_ms, "model call timed out");
                Err(InvocationError::Timeout(self.timeout))
            }
        }
    }

    async fn single_shot(&self, request: &LlmRequest) -> Result<String> {
        let response = self
            .backend
            .complete(&self.client, &self.base_url, request)
            .await?;
        Ok(response.text)
    }

    async fn streamed(&self, request: &LlmRequest) -> Result<String> {
        let mut buffer = String::new();
        let event_handler = self.event_handler.clone();
        let mut on_chunk = |chunk: String| {
            buffer.push_str(&chunk);
            emit(&event_handler, Event::Token { chunk });
        };

        self.backend
            .complete_streaming(&self.client, &self.base_url, request, &mut on_chunk)
            .await?;

        Ok(buffer)
    }
}

impl std::fmt::Debug for ModelInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelInvoker")
            .field("base_url", &self.base_url)
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .field("mode", &self.mode)
            .field("timeout", &self.timeout)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("has_event_handler", &self.event_handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::events::Recorder;

    fn invoker(mock: MockBackend) -> ModelInvoker {
        ModelInvoker::new(Client::new(), "http://unused", Arc::new(mock))
    }

    #[tokio::test]
    async fn test_single_shot_returns_text() {
        let text = invoker(MockBackend::fixed("Summary: A router."))
            .invoke("prompt")
            .await
            .unwrap();
        assert_eq!(text, "Summary: A router.");
    }

    #[tokio::test]
    async fn test_streaming_concatenates_chunks_in_order() {
        let recorder = Arc::new(Recorder::default());
        let text = invoker(MockBackend::fixed("Summary: a résumé parser.\nCool fact: x").with_chunk_chars(3))
            .with_mode(InvocationMode::Streaming)
            .with_event_handler(Some(recorder.clone() as Arc<dyn EventHandler>))
            .invoke("prompt")
            .await
            .unwrap();

        assert_eq!(text, "Summary: a résumé parser.\nCool fact: x");
        let tokens = recorder.tokens();
        assert!(tokens.len() > 1);
        assert_eq!(tokens.concat(), text);
    }

    #[tokio::test]
    async fn test_backend_failure_is_invocation_error() {
        let err = invoker(MockBackend::failing("connection refused"))
            .invoke("prompt")
            .await
            .unwrap_err();
        assert!(matches!(err, InvocationError::Other(ref m) if m == "connection refused"));
    }

    #[tokio::test]
    async fn test_timeout_elapses() {
        let err = invoker(MockBackend::fixed("late").with_delay(Duration::from_millis(500)))
            .with_timeout(Duration::from_millis(20))
            .invoke("prompt")
            .await
            .unwrap_err();
        assert!(matches!(err, InvocationError::Timeout(d) if d == Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_streaming_timeout_elapses() {
        let err = invoker(MockBackend::fixed("late").with_delay(Duration::from_millis(500)))
            .with_mode(InvocationMode::Streaming)
            .with_timeout(Duration::from_millis(20))
            .invoke("prompt")
            .await
            .unwrap_err();
        assert!(matches!(err, InvocationError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_cancelled_before_call() {
        let mock = Arc::new(MockBackend::fixed("unused"));
        let flag = Arc::new(AtomicBool::new(true));
        let invoker = ModelInvoker::new(Client::new(), "http://unused", mock.clone())
            .with_cancellation(Some(flag));

        let err = invoker.invoke("prompt").await.unwrap_err();
        assert!(matches!(err, InvocationError::Cancelled));
        assert_eq!(mock.calls(), 0);
    }

    #[test]
    fn test_debug_hides_handler_details() {
        let debug = format!("{:?}", invoker(MockBackend::fixed("x")));
        assert!(debug.contains("backend: \"mock\""));
        assert!(debug.contains("has_event_handler: false"));
    }
}
