use manzai_core::{GenerateRequest, Message};
use manzai_error::GenerationErrorKind;
use manzai_interface::GenerationClient;
use manzai_models::{ModelConfig, OpenAiCompatibleClient};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, timeout_secs: u64) -> OpenAiCompatibleClient {
    let config = ModelConfig::builder()
        .base_url(format!("{}/v1", server.uri()))
        .model("gpt-4o-mini")
        .timeout_secs(timeout_secs)
        .api_key(Some("test-key".to_string()))
        .build()
        .unwrap();
    OpenAiCompatibleClient::new(config).unwrap()
}

fn request() -> GenerateRequest {
    GenerateRequest::builder()
        .messages(vec![Message::system("漫才作家"), Message::user("回転寿司")])
        .max_tokens(Some(800))
        .build()
        .unwrap()
}

fn completion(content: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30 }
    })
}

#[tokio::test]
async fn successful_completion_returns_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 800,
            "temperature": 0.8,
            "messages": [
                { "role": "system", "content": "漫才作家" },
                { "role": "user", "content": "回転寿司" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!("ボケ: はい"))))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server, 10).generate(&request()).await.unwrap();
    assert_eq!(response.text, "ボケ: はい");
    assert_eq!(response.usage.map(|u| u.completion_tokens), Some(20));
}

#[tokio::test]
async fn rate_limit_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let err = client_for(&server, 10).generate(&request()).await.unwrap_err();
    assert_eq!(err.kind().code(), "rate_limit");
    assert_eq!(err.kind().status_hint(), 502);
    assert_eq!(err.kind().provider_detail(), Some("slow down"));
}

#[tokio::test]
async fn provider_error_keeps_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "error": { "message": "upstream exploded" } })),
        )
        .mount(&server)
        .await;

    let err = client_for(&server, 10).generate(&request()).await.unwrap_err();
    match err.kind() {
        GenerationErrorKind::Api {
            status,
            message,
            detail,
        } => {
            assert_eq!(*status, 500);
            assert_eq!(message, "upstream exploded");
            assert!(detail.as_deref().unwrap_or_default().contains("upstream exploded"));
        }
        other => panic!("unexpected kind: {other:?}"),
    }
}

#[tokio::test]
async fn empty_content_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!(""))))
        .mount(&server)
        .await;

    let err = client_for(&server, 10).generate(&request()).await.unwrap_err();
    assert_eq!(*err.kind(), GenerationErrorKind::EmptyOutput);
}

#[tokio::test]
async fn malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server, 10).generate(&request()).await.unwrap_err();
    assert_eq!(err.kind().code(), "invalid_response");
}

#[tokio::test]
async fn slow_provider_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion(json!("late")))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = client_for(&server, 1).generate(&request()).await.unwrap_err();
    assert_eq!(*err.kind(), GenerationErrorKind::Timeout { seconds: 1 });
}

#[tokio::test]
async fn missing_api_key_fails_without_calling_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!("x"))))
        .expect(0)
        .mount(&server)
        .await;

    let config = ModelConfig::builder()
        .base_url(format!("{}/v1", server.uri()))
        .build()
        .unwrap();
    let client = OpenAiCompatibleClient::new(config).unwrap();
    let err = client.generate(&request()).await.unwrap_err();
    assert_eq!(*err.kind(), GenerationErrorKind::MissingApiKey);
}

#[tokio::test]
async fn local_provider_needs_no_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "ボケ: ローカル" } }]
        })))
        .mount(&server)
        .await;

    let config = ModelConfig::builder()
        .provider("local")
        .base_url(format!("{}/v1", server.uri()))
        .build()
        .unwrap();
    let client = OpenAiCompatibleClient::new(config).unwrap();
    assert_eq!(client.generate(&request()).await.unwrap().text, "ボケ: ローカル");
}
