//! One bounded call to the generation backend.

use manzai_core::{GenerateRequest, InstructionPayload, Message};
use manzai_error::{GenerationError, GenerationErrorKind, GenerationResult};
use manzai_interface::GenerationClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Sends instruction payloads to a [`GenerationClient`] under a timeout.
///
/// Blank output counts as a failure.
#[derive(Clone)]
pub struct Generator {
    client: Arc<dyn GenerationClient>,
    temperature: f32,
    timeout: Duration,
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("provider", &self.client.provider_name())
            .field("model", &self.client.model_name())
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Generator {
    /// Wrap a client.
    pub fn new(client: Arc<dyn GenerationClient>, temperature: f32, timeout: Duration) -> Self {
        Self {
            client,
            temperature,
            timeout,
        }
    }

    /// Upper bound on one call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Generate text for a payload.
    ///
    /// # Errors
    ///
    /// Returns the client's classified failure, [`GenerationErrorKind::Timeout`]
    /// when the bound expires, or [`GenerationErrorKind::EmptyOutput`] for
    /// blank text.
    #[instrument(skip_all, fields(provider = self.client.provider_name(), max_tokens = max_tokens))]
    pub async fn generate(
        &self,
        instruction: &InstructionPayload,
        max_tokens: u32,
    ) -> GenerationResult<String> {
        let request = GenerateRequest::builder()
            .messages(vec![
                Message::system(instruction.system.clone()),
                Message::user(instruction.user.clone()),
            ])
            .max_tokens(Some(max_tokens))
            .temperature(Some(self.temperature))
            .build()
            .map_err(|e| GenerationError::new(GenerationErrorKind::InvalidRequest(e.to_string())))?;

        let response = tokio::time::timeout(self.timeout, self.client.generate(&request))
            .await
            .map_err(|_| {
                GenerationError::new(GenerationErrorKind::Timeout {
                    seconds: self.timeout.as_secs(),
                })
            })??;

        if response.text.trim().is_empty() {
            return Err(GenerationError::new(GenerationErrorKind::EmptyOutput));
        }
        debug!(
            chars = response.text.chars().count(),
            finish_reason = ?response.finish_reason,
            "Generation returned"
        );
        Ok(response.text)
    }
}
