//! Integration tests for the transcription client against a mocked service

use ai_speech::{HttpTranscriptionClient, SpeechError, TranscriptSource, TranscriptionConfig};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn config_for(base_url: &str) -> TranscriptionConfig {
    TranscriptionConfig {
        base_url: base_url.to_string(),
        timeout_ms: 1_000,
        probe_timeout_ms: 500,
    }
}

async fn mount_text(server: &MockServer, endpoint: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn final_text_is_returned_trimmed() {
    let server = MockServer::start().await;
    mount_text(&server, "/final", serde_json::json!({ "text": "  jeg vil have kaffe " })).await;

    let client = HttpTranscriptionClient::new(config_for(&server.uri())).unwrap();
    assert_eq!(
        client.final_text().await.unwrap().as_deref(),
        Some("jeg vil have kaffe")
    );
}

#[tokio::test]
async fn empty_partial_is_none() {
    let server = MockServer::start().await;
    mount_text(&server, "/partial", serde_json::json!({ "text": "" })).await;

    let client = HttpTranscriptionClient::new(config_for(&server.uri())).unwrap();
    assert!(client.partial_text().await.unwrap().is_none());
}

#[tokio::test]
async fn missing_or_null_text_is_none() {
    let server = MockServer::start().await;
    mount_text(&server, "/final", serde_json::json!({ "text": null })).await;
    mount_text(&server, "/partial", serde_json::json!({})).await;

    let client = HttpTranscriptionClient::new(config_for(&server.uri())).unwrap();
    assert!(client.final_text().await.unwrap().is_none());
    assert!(client.partial_text().await.unwrap().is_none());
}

#[tokio::test]
async fn error_status_is_service_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/final"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = HttpTranscriptionClient::new(config_for(&server.uri())).unwrap();
    let err = client.final_text().await.unwrap_err();
    assert!(matches!(err, SpeechError::ServiceUnavailable(_)));
    assert!(err.is_unreachable());
    assert!(!client.is_available().await);
}

#[tokio::test]
async fn non_json_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/final"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .mount(&server)
        .await;

    let client = HttpTranscriptionClient::new(config_for(&server.uri())).unwrap();
    assert!(matches!(
        client.final_text().await,
        Err(SpeechError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn unreachable_service() {
    let client = HttpTranscriptionClient::new(config_for("http://127.0.0.1:9")).unwrap();
    let err = client.final_text().await.unwrap_err();
    assert!(err.is_unreachable());
    assert!(!client.is_available().await);
}

#[tokio::test]
async fn available_when_final_answers() {
    let server = MockServer::start().await;
    mount_text(&server, "/final", serde_json::json!({ "text": "" })).await;

    let client = HttpTranscriptionClient::new(config_for(&server.uri())).unwrap();
    assert!(client.is_available().await);
}
