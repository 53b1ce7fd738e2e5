//! Conversion between manzai and chat-completions API types

use crate::{
    ChatCompletionRequest, ChatCompletionRequestBuilder, ChatCompletionResponse, ChatMessage,
};
use manzai_core::{GenerateRequest, GenerateResponse, TokenUsage};
use manzai_error::{GenerationError, GenerationErrorKind, GenerationResult};

/// Convert a [`GenerateRequest`] into a chat completion request.
///
/// Request-level model and temperature override the defaults.
#[tracing::instrument(skip(request))]
pub fn to_chat_request(
    request: &GenerateRequest,
    default_model: &str,
    default_temperature: f32,
) -> GenerationResult<ChatCompletionRequest> {
    if request.messages().is_empty() {
        return Err(GenerationError::new(GenerationErrorKind::InvalidRequest(
            "Request must contain at least one message".into(),
        )));
    }

    let messages = request
        .messages()
        .iter()
        .map(|m| ChatMessage::new(m.role.as_str(), m.content.clone()))
        .collect::<Vec<_>>();

    ChatCompletionRequestBuilder::default()
        .model(
            request
                .model()
                .clone()
                .unwrap_or_else(|| default_model.to_string()),
        )
        .messages(messages)
        .max_tokens(*request.max_tokens())
        .temperature(Some(request.temperature().unwrap_or(default_temperature)))
        .build()
        .map_err(|e| {
            GenerationError::new(GenerationErrorKind::InvalidRequest(format!(
                "Failed to build request: {}",
                e
            )))
        })
}

/// Convert a chat completion response into a [`GenerateResponse`].
///
/// A response without choices, or whose first choice has no visible text,
/// is an [`EmptyOutput`](GenerationErrorKind::EmptyOutput) failure.
#[tracing::instrument(skip(response))]
pub fn from_chat_response(response: ChatCompletionResponse) -> GenerationResult<GenerateResponse> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::new(GenerationErrorKind::EmptyOutput))?;

    let text = choice
        .message
        .content
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| GenerationError::new(GenerationErrorKind::EmptyOutput))?;

    Ok(GenerateResponse {
        text,
        finish_reason: choice.finish_reason,
        usage: response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Choice, ChoiceMessage};
    use manzai_core::Message;

    fn response(content: Option<&str>) -> ChatCompletionResponse {
        ChatCompletionResponse {
            choices: vec![Choice {
                message: ChoiceMessage {
                    content: content.map(String::from),
                },
                finish_reason: Some("stop".into()),
            }],
            usage: None,
        }
    }

    #[test]
    fn test_defaults_fill_missing_model_and_temperature() {
        let request = GenerateRequest::builder()
            .messages(vec![Message::system("s"), Message::user("u")])
            .max_tokens(Some(100))
            .build()
            .unwrap();
        let chat = to_chat_request(&request, "gpt-4o-mini", 0.8).unwrap();
        assert_eq!(chat.model, "gpt-4o-mini");
        assert_eq!(chat.temperature, Some(0.8));
        assert_eq!(chat.max_tokens, Some(100));
        assert_eq!(chat.messages[0].role, "system");
        assert_eq!(chat.messages[1].role, "user");
    }

    #[test]
    fn test_request_overrides_defaults() {
        let request = GenerateRequest::builder()
            .messages(vec![Message::user("u")])
            .model(Some("other".to_string()))
            .temperature(Some(0.2))
            .build()
            .unwrap();
        let chat = to_chat_request(&request, "gpt-4o-mini", 0.8).unwrap();
        assert_eq!(chat.model, "other");
        assert_eq!(chat.temperature, Some(0.2));
    }

    #[test]
    fn test_empty_messages_rejected() {
        let request = GenerateRequest::default();
        let err = to_chat_request(&request, "m", 0.8).unwrap_err();
        assert_eq!(err.kind().code(), "invalid_request");
    }

    #[test]
    fn test_text_extracted_and_trimmed() {
        let out = from_chat_response(response(Some("  A: hi \n"))).unwrap();
        assert_eq!(out.text, "A: hi");
        assert_eq!(out.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_blank_or_null_content_is_empty_output() {
        for content in [None, Some("   ")] {
            let err = from_chat_response(response(content)).unwrap_err();
            assert_eq!(*err.kind(), GenerationErrorKind::EmptyOutput);
        }
    }
}
