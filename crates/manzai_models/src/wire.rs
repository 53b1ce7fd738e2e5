//! Chat-completions payloads as they appear on the wire.
//!
//! Only the fields the client reads are modelled. Unknown fields in a
//! response are ignored, so self-hosted servers with extra metadata parse.

use serde::{Deserialize, Serialize};

/// Body of `POST {base_url}/chat/completions`.
#[derive(Debug, Clone, Serialize, PartialEq, derive_builder::Builder)]
#[builder(setter(into))]
pub struct ChatCompletionRequest {
    /// Model name sent to the provider
    pub model: String,
    /// System and user turns, in order
    pub messages: Vec<ChatMessage>,
    /// Completion budget
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub temperature: Option<f32>,
}

/// One turn in [`ChatCompletionRequest::messages`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`
    pub role: &'static str,
    /// Turn text
    pub content: String,
}

impl ChatMessage {
    /// Pair a wire role name with its text.
    pub fn new(role: &'static str, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Parsed completion body.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChatCompletionResponse {
    /// Candidates; the client only looks at the first
    pub choices: Vec<Choice>,
    /// Token accounting, when the provider reports it
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One completion candidate.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Choice {
    /// Assistant turn
    pub message: ChoiceMessage,
    /// `stop`, `length` and so on
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Assistant turn inside a [`Choice`].
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ChoiceMessage {
    /// Null when the model refused
    #[serde(default)]
    pub content: Option<String>,
}

/// Token counts for one call.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct Usage {
    /// Prompt side
    pub prompt_tokens: u32,
    /// Completion side
    pub completion_tokens: u32,
}
