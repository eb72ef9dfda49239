mod harness;

use harness::config::ConfigBuilder;
use harness::mock_model::MockModel;
use harness::server::TestServer;
use tts::ModelHandle;

#[tokio::test]
async fn health_endpoint_returns_service_status() {
    let config = ConfigBuilder::new().build();
    let server = TestServer::start(config, MockModel::new().primary()).await.unwrap();

    let resp = server.client().get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"status": "ok", "service": "qualia-vibevoice"}));
}

#[tokio::test]
async fn health_endpoint_uses_configured_name_and_path() {
    let config = ConfigBuilder::new()
        .with_service_name("voice-edge")
        .with_health_path("/healthz")
        .build();
    let server = TestServer::start(config, MockModel::new().primary()).await.unwrap();

    let resp = server.client().get(server.url("/healthz")).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["service"], "voice-edge");

    let resp = server.client().get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn health_endpoint_disabled() {
    let config = ConfigBuilder::new().without_health().build();
    let server = TestServer::start(config, MockModel::new().primary()).await.unwrap();

    let resp = server.client().get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn health_does_not_wait_for_model() {
    let config = ConfigBuilder::new().build();
    let server = TestServer::start_with_handle(config, ModelHandle::new()).await.unwrap();

    let resp = server.client().get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
}
