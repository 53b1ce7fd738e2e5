use crate::{ChatCompletionRequest, ChatCompletionResponse, ModelConfig, convert};
use async_trait::async_trait;
use manzai_core::{GenerateRequest, GenerateResponse};
use manzai_error::{GenerationError, GenerationErrorKind, GenerationResult};
use manzai_interface::GenerationClient;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::instrument;

/// Client for OpenAI-compatible chat completion endpoints
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    config: ModelConfig,
    client: reqwest::Client,
}

impl OpenAiCompatibleClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialised.
    #[instrument(skip(config), fields(base_url = %config.base_url, model = %config.model))]
    pub fn new(config: ModelConfig) -> GenerationResult<Self> {
        tracing::debug!("Creating generation client");
        let client = reqwest::Client::builder().build().map_err(|e| {
            GenerationError::new(GenerationErrorKind::Http(format!(
                "Failed to build HTTP client: {}",
                e
            )))
        })?;
        Ok(Self { config, client })
    }

    /// Get the client configuration
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Send a chat completion request, bounded by the configured timeout
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> GenerationResult<ChatCompletionResponse> {
        if self.config.api_key.is_none() && self.config.requires_api_key() {
            tracing::error!("No API key configured");
            return Err(GenerationError::new(GenerationErrorKind::MissingApiKey));
        }

        let url = self.config.completions_url();
        tracing::debug!("Sending chat completion request to {}", url);

        let mut req = self.client.post(&url).json(request);
        if let Some(api_key) = &self.config.api_key {
            req = req.bearer_auth(api_key);
        }

        let seconds = self.config.timeout_secs;
        let call = async {
            let response = req.send().await.map_err(|e| {
                tracing::error!("Request failed: {}", e);
                GenerationError::new(GenerationErrorKind::Http(format!("Request failed: {}", e)))
            })?;
            read_response(response).await
        };

        match tokio::time::timeout(Duration::from_secs(seconds), call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(seconds, "Chat completion timed out");
                Err(GenerationError::new(GenerationErrorKind::Timeout { seconds }))
            }
        }
    }
}

async fn read_response(response: reqwest::Response) -> GenerationResult<ChatCompletionResponse> {
    let status = response.status();
    let body = response.text().await.map_err(|e| {
        GenerationError::new(GenerationErrorKind::Http(format!(
            "Failed to read response body: {}",
            e
        )))
    })?;

    if status == StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!("Provider rate limit exceeded");
        return Err(GenerationError::new(GenerationErrorKind::RateLimited {
            detail: non_empty(body),
        }));
    }

    if !status.is_success() {
        tracing::error!("Provider returned error: {}", status);
        let message = provider_message(&body)
            .or_else(|| status.canonical_reason().map(String::from))
            .unwrap_or_else(|| status.to_string());
        return Err(GenerationError::new(GenerationErrorKind::Api {
            status: status.as_u16(),
            message,
            detail: non_empty(body),
        }));
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!("Failed to parse response: {}", e);
        GenerationError::new(GenerationErrorKind::ResponseParsing(e.to_string()))
    })
}

/// Extract `error.message` (or a bare `error` string) from a provider body.
fn provider_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    error
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| error.as_str())
        .map(String::from)
}

fn non_empty(body: String) -> Option<String> {
    if body.trim().is_empty() { None } else { Some(body) }
}

#[async_trait]
impl GenerationClient for OpenAiCompatibleClient {
    #[instrument(skip(self, req), fields(provider = %self.config.provider))]
    async fn generate(&self, req: &GenerateRequest) -> GenerationResult<GenerateResponse> {
        let chat_request =
            convert::to_chat_request(req, &self.config.model, self.config.temperature)?;
        let response = self.chat_completion(&chat_request).await?;
        let generated = convert::from_chat_response(response)?;
        tracing::debug!(
            chars = generated.text.chars().count(),
            finish_reason = ?generated.finish_reason,
            "Chat completion successful"
        );
        Ok(generated)
    }

    fn provider_name(&self) -> &'static str {
        "openai-compatible"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
