use dexa_api::OpenAiGateway;
use dexa_core::completion::{ChatTurn, CompletionRequest};
use dexa_core::domain::LlmConfig;
use dexa_core::{CompletionProvider, CoreError};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> LlmConfig {
    LlmConfig {
        api_base: format!("{}/v1", server.uri()),
        api_key: "sk-test".to_string(),
        model: "gpt-test".to_string(),
        timeout_seconds: 5,
        ..Default::default()
    }
}

fn request() -> CompletionRequest {
    CompletionRequest::new(vec![ChatTurn::system("be brief"), ChatTurn::user("mean of a?")])
}

// ===== Completion Tests =====

#[tokio::test]
async fn test_complete_posts_chat_completion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-test",
            "temperature": 0.5,
            "max_tokens": 1200,
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "mean of a?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "model": "gpt-test-0613",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Analysis: 2"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = OpenAiGateway::new(config_for(&server)).unwrap();
    let completion = gateway.complete(request().with_temperature(0.5)).await.unwrap();

    assert_eq!(completion.text, "Analysis: 2");
    assert_eq!(completion.model, "gpt-test-0613");
    assert_eq!(completion.usage.unwrap().total_tokens, 15);
}

#[tokio::test]
async fn test_missing_content_yields_empty_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let gateway = OpenAiGateway::new(config_for(&server)).unwrap();
    let completion = gateway.complete(request()).await.unwrap();

    assert_eq!(completion.text, "");
    assert_eq!(completion.model, "gpt-test");
}

// ===== Error Mapping Tests =====

#[tokio::test]
async fn test_error_status_maps_to_upstream() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let gateway = OpenAiGateway::new(config_for(&server)).unwrap();
    let err = gateway.complete(request()).await.unwrap_err();

    match err {
        CoreError::Upstream(msg) => assert_eq!(msg, "LLM API error (429): rate limited"),
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_maps_to_upstream() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let gateway = OpenAiGateway::new(config_for(&server)).unwrap();
    let err = gateway.complete(request()).await.unwrap_err();

    assert!(matches!(err, CoreError::Upstream(_)));
}

#[test]
fn test_endpoint_trims_trailing_slash() {
    let gateway = OpenAiGateway::new(LlmConfig {
        api_base: "https://llm.internal/v1/".to_string(),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(gateway.endpoint(), "https://llm.internal/v1/chat/completions");
}
