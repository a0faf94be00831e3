//! Backend for Ollama's native API.
//!
//! [`OllamaBackend`] sends the prompt to `/api/generate`.
//! Streaming uses NDJSON with `{"response": "chunk"}` per line.

use super::{post_json, Backend, LlmRequest, LlmResponse};
use crate::config::TEMPERATURE;
use crate::error::Result;
use crate::streaming::NdjsonDecoder;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};

/// Backend for a local or remote Ollama server.
#[derive(Debug, Clone, Default)]
pub struct OllamaBackend;

impl OllamaBackend {
    /// Build the JSON body for `/api/generate`.
    fn build_body(request: &LlmRequest, stream: bool) -> Value {
        let mut body = json!({
            "model": request.config.model,
            "prompt": request.prompt,
            "stream": stream,
            "options": {
                "temperature": TEMPERATURE,
                "num_predict": request.config.max_tokens,
            },
        });
        if request.config.json_mode {
            body["format"] = json!("json");
        }
        body
    }

    fn extract_metadata(json_resp: &Value) -> Option<Value> {
        let meta: serde_json::Map<String, Value> = [
            "total_duration",
            "eval_count",
            "eval_duration",
            "prompt_eval_count",
            "model",
        ]
        .into_iter()
        .filter_map(|key| json_resp.get(key).map(|v| (key.to_string(), v.clone())))
        .collect();
        (!meta.is_empty()).then_some(Value::Object(meta))
    }

    /// Apply one NDJSON line: forward its text, remember final metadata.
    fn absorb(
        line: &Value,
        accumulated: &mut String,
        metadata: &mut Option<Value>,
        on_chunk: &mut (dyn FnMut(String) + Send),
    ) {
        if let Some(text) = line.get("response").and_then(|r| r.as_str()) {
            if !text.is_empty() {
                accumulated.push_str(text);
                on_chunk(text.to_string());
            }
        }
        if line.get("done").and_then(|v| v.as_bool()) == Some(true) {
            *metadata = Self::extract_metadata(line);
        }
    }
}

#[async_trait]
impl Backend for OllamaBackend {
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        let url = format!("{}/api/generate", base_url.trim_end_matches('/'));
        let body = Self::build_body(request, false);

        let resp = post_json(client.post(&url).json(&body), &url).await?;
        let status = resp.status().as_u16();
        let json_resp: Value = resp.json().await?;

        let text = json_resp
            .get("response")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(LlmResponse {
            text,
            status,
            metadata: Self::extract_metadata(&json_resp),
        })
    }

    async fn complete_streaming(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
        on_chunk: &mut (dyn FnMut(String) + Send),
    ) -> Result<LlmResponse> {
        let url = format!("{}/api/generate", base_url.trim_end_matches('/'));
        let body = Self::build_body(request, true);

        let resp = post_json(client.post(&url).json(&body), &url).await?;
        let status = resp.status().as_u16();

        let mut stream = resp.bytes_stream();
        let mut decoder = NdjsonDecoder::new();
        let mut accumulated = String::new();
        let mut metadata = None;

        while let Some(chunk) = stream.next().await {
            for line in decoder.decode(&chunk?) {
                Self::absorb(&line, &mut accumulated, &mut metadata, on_chunk);
            }
        }
        if let Some(line) = decoder.flush() {
            Self::absorb(&line, &mut accumulated, &mut metadata, on_chunk);
        }

        Ok(LlmResponse {
            text: accumulated,
            status,
            metadata,
        })
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
