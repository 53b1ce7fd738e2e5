//! Generation backends for the manzai script generator.
//!
//! Ships one [`GenerationClient`](manzai_interface::GenerationClient)
//! implementation: [`OpenAiCompatibleClient`], which speaks the
//! chat-completions protocol used by OpenAI and most self-hosted inference
//! servers. Every failure is classified into a
//! [`GenerationErrorKind`](manzai_error::GenerationErrorKind) so the service
//! can choose a status code without inspecting provider bodies.
//!
//! # Example
//!
//! ```rust,no_run
//! use manzai_core::{GenerateRequest, Message};
//! use manzai_interface::GenerationClient;
//! use manzai_models::{ModelConfig, OpenAiCompatibleClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ModelConfig::default().with_api_key("sk-...");
//! let client = OpenAiCompatibleClient::new(config)?;
//! let request = GenerateRequest::builder()
//!     .messages(vec![Message::user("回転寿司の漫才を書いて")])
//!     .build()?;
//! let response = client.generate(&request).await?;
//! println!("{}", response.text);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod convert;
mod wire;

pub use client::OpenAiCompatibleClient;
pub use config::{ModelConfig, ModelConfigBuilder, ModelConfigBuilderError};
pub use convert::{from_chat_response, to_chat_request};
pub use wire::{
    ChatCompletionRequest, ChatCompletionRequestBuilder, ChatCompletionResponse, ChatMessage,
    Choice, ChoiceMessage, Usage,
};
