//! Gemini backend against a mock Generative Language API.

use decknotes_core::types::ChatTurn;
use decknotes_core::{GenerationErrorKind, GenerativeBackend, Part};
use decknotes_llm::{BackendConfig, GeminiBackend};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

fn backend(server: &MockServer) -> GeminiBackend {
    GeminiBackend::new(BackendConfig {
        api_key: Some("test-key".to_string()),
        base_url: Some(format!("{}/v1beta", server.uri())),
        ..BackendConfig::default()
    })
    .unwrap()
}

fn answer(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn test_generate_sends_key_and_inline_images() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {"text": "Make notes"},
                    {"inlineData": {"mimeType": "image/png", "data": "iVBO"}}
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer("# Notes")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = backend(&server)
        .generate(vec![
            Part::text("Make notes"),
            Part::image("image/png", vec![0x89, 0x50, 0x4e]),
        ])
        .await
        .unwrap();
    assert_eq!(reply, "# Notes");
}

#[tokio::test]
async fn test_conversation_carries_history() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_partial_json(json!({
            "contents": [
                {"role": "user", "parts": [{"text": "notes here"}]},
                {"role": "model", "parts": [{"text": "Understood"}]},
                {"role": "user", "parts": [{"text": "What is ATP?"}]}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer("Energy currency")))
        .mount(&server)
        .await;

    let backend = backend(&server);
    let mut conversation = backend.start_conversation(&[
        ChatTurn::user("notes here"),
        ChatTurn::model("Understood"),
    ]);
    let reply = backend
        .send(&mut conversation, vec![Part::text("What is ATP?")])
        .await
        .unwrap();

    assert_eq!(reply, "Energy currency");
    assert_eq!(conversation.len(), 4);
}

#[tokio::test]
async fn test_status_mapping() {
    let cases = [
        (400, GenerationErrorKind::InvalidRequest),
        (403, GenerationErrorKind::Authentication),
        (429, GenerationErrorKind::RateLimited),
        (503, GenerationErrorKind::Unavailable),
    ];

    for (status, expected) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": {"code": status, "message": "upstream said no", "status": "X"}
            })))
            .mount(&server)
            .await;

        let err = backend(&server)
            .generate(vec![Part::text("hi")])
            .await
            .unwrap_err();
        assert_eq!(err.generation_kind(), Some(expected), "status {}", status);
        assert!(err.to_string().contains("upstream said no"));
    }
}

#[tokio::test]
async fn test_failed_send_leaves_conversation_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let backend = backend(&server);
    let mut conversation = backend.start_conversation(&[]);
    let err = backend
        .send(&mut conversation, vec![Part::text("q")])
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert!(conversation.is_empty());
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Nothing listens on port 1.
    let backend = GeminiBackend::new(BackendConfig {
        api_key: Some("test-key".to_string()),
        base_url: Some("http://127.0.0.1:1/v1beta".to_string()),
        timeout_secs: Some(5),
        ..BackendConfig::default()
    })
    .unwrap();

    let err = backend.generate(vec![Part::text("hi")]).await.unwrap_err();
    assert_eq!(err.generation_kind(), Some(GenerationErrorKind::Network));
}
