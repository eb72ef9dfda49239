//! Test server wrapper that starts the service on a random port

use std::net::SocketAddr;

use tts::ModelHandle;
use vibevoice_config::Config;
use vibevoice_server::Server;
use tokio_util::sync::CancellationToken;

/// A running test server instance
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
    model: ModelHandle,
}

impl TestServer {
    /// Start a test server whose model is already loaded
    pub async fn start(config: Config, context: tts::ModelContext) -> anyhow::Result<Self> {
        Self::start_with_handle(config, ModelHandle::ready(context)).await
    }

    /// Start a test server around an existing model handle
    ///
    /// Binds to port 0 for automatic port assignment
    pub async fn start_with_handle(config: Config, model: ModelHandle) -> anyhow::Result<Self> {
        let server = Server::new(&config, model.clone())?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        // Bind the listener here so we know the actual port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, server.into_router())
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        let client = reqwest::Client::new();

        Ok(Self {
            addr,
            shutdown,
            client,
            model,
        })
    }

    /// Base URL of the running test server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Get a reference to the HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Handle onto the server's model state
    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    /// POST a JSON body to `/tts` and decode the JSON answer
    pub async fn synthesize(&self, body: serde_json::Value) -> (reqwest::StatusCode, serde_json::Value) {
        let resp = self
            .client
            .post(self.url("/tts"))
            .json(&body)
            .send()
            .await
            .unwrap();

        let status = resp.status();
        (status, resp.json().await.unwrap())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
