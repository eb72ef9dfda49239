mod harness;

use harness::config::ConfigBuilder;
use harness::mock_model::MockModel;
use harness::server::TestServer;
use vibevoice_config::{AllowList, CorsConfig};

async fn preflight(server: &TestServer, origin: &str) -> reqwest::Response {
    server
        .client()
        .request(reqwest::Method::OPTIONS, server.url("/tts"))
        .header("Origin", origin)
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await
        .unwrap()
}

fn allow_origin(resp: &reqwest::Response) -> Option<&str> {
    resp.headers()
        .get("access-control-allow-origin")
        .and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn browser_preflight_for_synthesis_is_answered() {
    let config = ConfigBuilder::new().with_cors(CorsConfig::default()).build();
    let server = TestServer::start(config, MockModel::new().primary()).await.unwrap();

    let resp = preflight(&server, "http://localhost:3000").await;

    assert_eq!(resp.status(), 200);
    assert_eq!(allow_origin(&resp), Some("*"));
    let methods = resp.headers()["access-control-allow-methods"].to_str().unwrap();
    assert!(methods.contains("POST"));
}

#[tokio::test]
async fn configured_origin_gets_headers_on_synthesis() {
    let config = ConfigBuilder::new()
        .with_cors(CorsConfig {
            origins: AllowList::Only(vec!["https://app.example".to_owned()]),
            ..CorsConfig::default()
        })
        .build();
    let server = TestServer::start(config, MockModel::new().primary()).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/tts"))
        .header("Origin", "https://app.example")
        .json(&serde_json::json!({"text": "hello"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(allow_origin(&resp), Some("https://app.example"));

    let resp = preflight(&server, "https://other.example").await;
    assert_eq!(allow_origin(&resp), None);
}

#[tokio::test]
async fn no_cors_headers_without_config() {
    let server = TestServer::start(ConfigBuilder::new().build(), MockModel::new().primary())
        .await
        .unwrap();

    let resp = server
        .client()
        .get(server.url("/health"))
        .header("Origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(allow_origin(&resp), None);
}
