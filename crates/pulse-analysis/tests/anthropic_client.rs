//! Integration tests for `AnthropicClient` against a local `wiremock` server.

use pulse_analysis::{AnalysisClient, AnalysisError, AnalysisRequest, AnthropicClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer, max_retries: u32) -> AnthropicClient {
    AnthropicClient::with_base_url(
        "sk-test",
        "claude-test",
        5,
        "pulse-test/0.1",
        max_retries,
        0,
        &server.uri(),
    )
    .expect("failed to build test AnthropicClient")
}

fn request() -> AnalysisRequest {
    AnalysisRequest::new("You are a content coach.", "Suggest an idea.", 256)
}

#[tokio::test]
async fn text_is_returned() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-test",
            "max_tokens": 256,
            "system": "You are a content coach.",
            "messages": [{"role": "user", "content": "Suggest an idea."}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "Film a duet of your song."}],
            "stop_reason": "end_turn"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = test_client(&server, 0).complete(&request()).await.unwrap();
    assert_eq!(text, "Film a duet of your song.");
}

#[tokio::test]
async fn overloaded_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "ok"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = test_client(&server, 2).complete(&request()).await.unwrap();
    assert_eq!(text, "ok");
}

#[tokio::test]
async fn rate_limit_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "12"))
        .mount(&server)
        .await;

    let result = test_client(&server, 0).complete(&request()).await;
    assert!(matches!(
        result,
        Err(AnalysisError::RateLimited {
            retry_after_secs: 12
        })
    ));
}

#[tokio::test]
async fn bad_request_is_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string(r#"{"error":{"message":"bad model"}}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = test_client(&server, 3).complete(&request()).await;
    match result {
        Err(AnalysisError::UnexpectedStatus { status, body }) => {
            assert_eq!(status, 400);
            assert!(body.contains("bad model"));
        }
        other => panic!("expected UnexpectedStatus, got: {other:?}"),
    }
}

#[tokio::test]
async fn missing_text_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
        .mount(&server)
        .await;

    let result = test_client(&server, 0).complete(&request()).await;
    assert!(matches!(result, Err(AnalysisError::Malformed { .. })));
}
