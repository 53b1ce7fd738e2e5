//! Request and response types for the generation backend.

use crate::Message;
use serde::{Deserialize, Serialize};

/// Generation request handed to a generation backend.
///
/// # Examples
///
/// ```
/// use manzai_core::{GenerateRequest, Message};
///
/// let request = GenerateRequest::builder()
///     .messages(vec![Message::system("You write manzai."), Message::user("Go")])
///     .max_tokens(Some(1200))
///     .temperature(Some(0.8))
///     .model(Some("gpt-4o-mini".to_string()))
///     .build()
///     .unwrap();
///
/// assert_eq!(request.messages().len(), 2);
/// assert_eq!(*request.max_tokens(), Some(1200));
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    Default,
    derive_builder::Builder,
    derive_getters::Getters,
)]
#[builder(setter(into))]
pub struct GenerateRequest {
    /// The conversation messages to send
    messages: Vec<Message>,
    /// Maximum number of tokens to generate
    #[builder(default)]
    max_tokens: Option<u32>,
    /// Sampling temperature
    #[builder(default)]
    temperature: Option<f32>,
    /// Model identifier override
    #[builder(default)]
    model: Option<String>,
}

impl GenerateRequest {
    /// Creates a new request builder.
    pub fn builder() -> GenerateRequestBuilder {
        GenerateRequestBuilder::default()
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,
    /// Tokens in the completion
    pub completion_tokens: u32,
}

/// Raw text returned by the generation backend.
///
/// # Examples
///
/// ```
/// use manzai_core::GenerateResponse;
///
/// let response = GenerateResponse::text("A: hello");
/// assert_eq!(response.text, "A: hello");
/// assert!(response.usage.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Generated text
    pub text: String,
    /// Why the provider stopped, as reported
    pub finish_reason: Option<String>,
    /// Token usage, when reported
    pub usage: Option<TokenUsage>,
}

impl GenerateResponse {
    /// A response carrying only text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finish_reason: None,
            usage: None,
        }
    }
}
