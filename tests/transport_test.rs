//! `TransportClient` against a mock backend.

use nexus_client::transport::{ChatRequest, Transport, UploadPayload};
use nexus_client::{ClientConfig, Language, TransportClient, TransportError};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(base: &str) -> TransportClient {
    TransportClient::new(&ClientConfig::new(base).unwrap()).unwrap()
}

fn question() -> ChatRequest {
    ChatRequest {
        message: "What is this?".into(),
        language: Language::En,
        use_voice: false,
    }
}

#[tokio::test]
async fn test_non_success_status_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("engine offline"))
        .mount(&server)
        .await;

    let err = transport(&server.uri()).chat(&question()).await.unwrap_err();
    match err {
        TransportError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "engine offline");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&server)
        .await;

    let err = transport(&server.uri())
        .upload(UploadPayload {
            filename: "a.txt".into(),
            mime_type: "text/plain".into(),
            bytes: "hello".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Parse(_)));
}

#[tokio::test]
async fn test_chat_accepts_text_alias() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "aliased",
            "audio_url": "https://cdn.example.com/a.mp3",
        })))
        .mount(&server)
        .await;

    let resp = transport(&server.uri()).chat(&question()).await.unwrap();
    assert_eq!(resp.response, "aliased");
    assert_eq!(resp.audio_url.as_deref(), Some("https://cdn.example.com/a.mp3"));
}

#[tokio::test]
async fn test_request_timeout_is_applied() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "late"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let mut config = ClientConfig::new(&server.uri()).unwrap();
    config.request_timeout = Some(Duration::from_millis(100));
    let client = TransportClient::new(&config).unwrap();

    let err = client.chat(&question()).await.unwrap_err();
    assert!(matches!(err, TransportError::Http(ref e) if e.is_timeout()));
}

#[tokio::test]
async fn test_health_and_languages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "message": "Room AI Assistant is running smoothly!",
            "services": {"rag": "available", "voice": "coming_soon"},
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "translation": {"en": "English", "hi": "Hindi (basic support)"},
            "voice": {"en": "English (coming soon)"},
        })))
        .mount(&server)
        .await;

    let client = transport(&server.uri());
    let health = client.health().await.unwrap();
    assert!(health.is_healthy());
    assert_eq!(health.services["rag"], "available");

    let languages = client.languages().await.unwrap();
    assert_eq!(languages.translation.len(), 2);
    assert_eq!(languages.voice["en"], "English (coming soon)");
}

#[tokio::test]
async fn test_set_openai_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/set-openai-key"))
        .and(body_partial_json(json!({"api_key": "sk-test-1234567890"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "OpenAI API key set successfully!",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let message = transport(&server.uri())
        .set_openai_key("sk-test-1234567890", None)
        .await
        .unwrap();
    assert_eq!(message, "OpenAI API key set successfully!");
}
