//! Connection settings for the generation backend.

use serde::{Deserialize, Serialize};

/// Settings for an OpenAI-compatible endpoint.
///
/// # Examples
///
/// ```
/// use manzai_models::ModelConfig;
///
/// let config = ModelConfig::builder()
///     .base_url("http://localhost:8080/v1")
///     .provider("local")
///     .model("mistral-7b")
///     .build()
///     .unwrap();
/// assert!(!config.requires_api_key());
/// assert_eq!(config.completions_url(), "http://localhost:8080/v1/chat/completions");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct ModelConfig {
    /// Provider name; `local` endpoints need no API key
    pub provider: String,
    /// API root, including the version segment
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Default sampling temperature
    pub temperature: f32,
    /// Upper bound on one generation call, in seconds
    pub timeout_secs: u64,
    /// Bearer token
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.8,
            timeout_secs: 60,
            api_key: None,
        }
    }
}

impl ModelConfig {
    /// Creates a new builder.
    pub fn builder() -> ModelConfigBuilder {
        ModelConfigBuilder::default()
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Whether calls must carry an API key.
    pub fn requires_api_key(&self) -> bool {
        self.provider != "local"
    }

    /// Chat completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
