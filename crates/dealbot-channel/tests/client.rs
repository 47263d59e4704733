//! Integration tests for `ChannelClient` against a wiremock server.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dealbot_channel::{ChannelClient, ChannelError};

fn test_client(server: &MockServer) -> ChannelClient {
    ChannelClient::with_base_url("123456:test-token", 5, &server.uri())
        .expect("failed to build test ChannelClient")
}

#[tokio::test]
async fn send_message_returns_message_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123456:test-token/sendMessage"))
        .and(body_partial_json(json!({
            "chat_id": "@deals_channel",
            "parse_mode": "Markdown"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "ok": true,
            "result": { "message_id": 4242, "chat": { "id": 1 } }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let message_id = client
        .send_message("@deals_channel", "🔥 deal text")
        .await
        .expect("send_message");

    assert_eq!(message_id, 4242);
}

#[tokio::test]
async fn api_rejection_surfaces_description() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123456:test-token/sendMessage"))
        .respond_with(ResponseTemplate::new(400).set_body_json(&json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.send_message("@missing", "text").await;

    match result.unwrap_err() {
        ChannelError::Api { description } => {
            assert!(description.contains("chat not found"), "{description}");
        }
        other => panic!("expected ChannelError::Api, got: {other:?}"),
    }
}

#[tokio::test]
async fn non_json_response_is_a_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123456:test-token/sendMessage"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.send_message("@deals_channel", "text").await;

    assert!(
        matches!(result, Err(ChannelError::Deserialize { .. })),
        "expected Deserialize error, got: {result:?}"
    );
}

#[tokio::test]
async fn unreachable_host_is_an_http_error() {
    let client =
        ChannelClient::with_base_url("123456:test-token", 1, "http://127.0.0.1:1").expect("client");
    let result = client.send_message("@deals_channel", "text").await;

    assert!(
        matches!(result, Err(ChannelError::Http(_))),
        "expected Http error, got: {result:?}"
    );
}
