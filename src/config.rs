//! Model and analyzer configuration.
//!
//! [`LlmConfig`] is what each backend request carries. [`AnalyzerSettings`]
//! is the serializable, environment-loadable description of a whole
//! analyzer; [`AnalyzerSettings::into_builder`] turns it into a
//! [`ReadmeAnalyzerBuilder`](crate::analyzer::ReadmeAnalyzerBuilder).

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::analyzer::{ReadmeAnalyzer, ReadmeAnalyzerBuilder};
use crate::backend::{Backend, OllamaBackend, OpenAiBackend};
use crate::error::ConfigError;
use crate::fallback::FallbackPolicy;
use crate::output_strategy::OutputStrategy;

/// Sampling temperature for every request. Fixed for deterministic-leaning
/// output.
pub const TEMPERATURE: f64 = 0.0;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Per-request model configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    /// Model identifier (e.g. `"gpt-3.5-turbo"`, `"llama3.2"`).
    pub model: String,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Ask the provider for JSON output.
    pub json_mode: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            json_mode: false,
        }
    }
}

impl LlmConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = enabled;
        self
    }
}

/// Single-shot or streamed model invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationMode {
    #[default]
    SingleShot,
    Streaming,
}

/// Which provider API to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    #[default]
    OpenAi,
    Ollama,
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "ollama" => Ok(Provider::Ollama),
            _ => Err(ConfigError::InvalidValue {
                key: "provider",
                value: s.to_string(),
                reason: "expected `openai` or `ollama`".to_string(),
            }),
        }
    }
}

/// Serializable analyzer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    pub provider: Provider,
    pub base_url: String,
    /// Never serialized, so settings can be logged or written out safely.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub strategy: OutputStrategy,
    pub mode: InvocationMode,
    pub timeout_secs: u64,
    pub fallback_policy: FallbackPolicy,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            strategy: OutputStrategy::default(),
            mode: InvocationMode::default(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            fallback_policy: FallbackPolicy::default(),
        }
    }
}

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_PROVIDER: &str = "README_DIGEST_PROVIDER";
pub const ENV_BASE_URL: &str = "README_DIGEST_BASE_URL";
pub const ENV_MODEL: &str = "README_DIGEST_MODEL";
pub const ENV_STRATEGY: &str = "README_DIGEST_STRATEGY";
pub const ENV_STREAMING: &str = "README_DIGEST_STREAMING";
pub const ENV_TIMEOUT_SECS: &str = "README_DIGEST_TIMEOUT_SECS";

impl AnalyzerSettings {
    /// Load settings from the process environment.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingVar`] if the OpenAI provider is selected and
    ///   `OPENAI_API_KEY` is unset
    /// - [`ConfigError::InvalidValue`] for unparseable values
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(provider) = lookup(ENV_PROVIDER) {
            settings.provider = provider.parse()?;
        }
        if settings.provider == Provider::Ollama {
            settings.base_url = "http://localhost:11434".to_string();
        }
        if let Some(url) = lookup(ENV_BASE_URL) {
            settings.base_url = url;
        }
        if let Some(model) = lookup(ENV_MODEL) {
            settings.model = model;
        }
        if let Some(strategy) = lookup(ENV_STRATEGY) {
            settings.strategy = strategy.parse()?;
        }
        if let Some(streaming) = lookup(ENV_STREAMING) {
            settings.mode = if parse_bool(ENV_STREAMING, &streaming)? {
                InvocationMode::Streaming
            } else {
                InvocationMode::SingleShot
            };
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            settings.timeout_secs = secs
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: ENV_TIMEOUT_SECS,
                    value: secs.clone(),
                    reason: "expected a positive number of seconds".to_string(),
                })?;
        }

        settings.api_key = lookup(ENV_API_KEY).filter(|k| !k.trim().is_empty());
        if settings.provider == Provider::OpenAi && settings.api_key.is_none() {
            return Err(ConfigError::MissingVar(ENV_API_KEY));
        }

        Ok(settings)
    }

    fn backend(&self) -> Arc<dyn Backend> {
        match self.provider {
            Provider::OpenAi => {
                let mut backend = OpenAiBackend::new();
                if let Some(ref key) = self.api_key {
                    backend = backend.with_api_key(key.clone());
                }
                Arc::new(backend)
            }
            Provider::Ollama => Arc::new(OllamaBackend),
        }
    }

    /// A builder preloaded with these settings.
    pub fn into_builder(self) -> ReadmeAnalyzerBuilder {
        ReadmeAnalyzer::builder(self.base_url.as_str())
            .backend(self.backend())
            .model(self.model)
            .max_tokens(self.max_tokens)
            .strategy(self.strategy)
            .mode(self.mode)
            .timeout(Duration::from_secs(self.timeout_secs))
            .fallback_policy(self.fallback_policy)
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_llm_config_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert!(!config.json_mode);
    }

    #[test]
    fn test_openai_requires_api_key() {
        let err = AnalyzerSettings::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingVar(ENV_API_KEY));
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let err = AnalyzerSettings::from_lookup(lookup(&[(ENV_API_KEY, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingVar(ENV_API_KEY));
    }

    #[test]
    fn test_env_overrides() {
        let settings = AnalyzerSettings::from_lookup(lookup(&[
            (ENV_API_KEY, "sk-test"),
            (ENV_MODEL, "gpt-4o-mini"),
            (ENV_STRATEGY, "schema"),
            (ENV_STREAMING, "true"),
            (ENV_TIMEOUT_SECS, "15"),
        ]))
        .unwrap();
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.strategy, OutputStrategy::SchemaGuided);
        assert_eq!(settings.mode, InvocationMode::Streaming);
        assert_eq!(settings.timeout_secs, 15);
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_ollama_needs_no_key_and_defaults_local() {
        let settings = AnalyzerSettings::from_lookup(lookup(&[(ENV_PROVIDER, "ollama")])).unwrap();
        assert_eq!(settings.provider, Provider::Ollama);
        assert_eq!(settings.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_invalid_values_rejected() {
        for (key, value) in [
            (ENV_STREAMING, "maybe"),
            (ENV_TIMEOUT_SECS, "0"),
            (ENV_TIMEOUT_SECS, "soon"),
            (ENV_STRATEGY, "xml"),
        ] {
            let result = AnalyzerSettings::from_lookup(lookup(&[(ENV_API_KEY, "sk"), (key, value)]));
            assert!(
                matches!(result, Err(ConfigError::InvalidValue { .. })),
                "{key}={value}"
            );
        }
    }

    #[test]
    fn test_api_key_never_serialized() {
        let settings = AnalyzerSettings {
            api_key: Some("sk-secret".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("sk-secret"));
    }

    #[test]
    fn test_partial_settings_deserialize_with_defaults() {
        let settings: AnalyzerSettings =
            serde_json::from_str(r#"{"strategy": "schema_guided", "mode": "streaming"}"#).unwrap();
        assert_eq!(settings.strategy, OutputStrategy::SchemaGuided);
        assert_eq!(settings.model, DEFAULT_MODEL);
    }
}
