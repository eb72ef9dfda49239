//! HTTP host for the speech service
//!
//! Wires the synthesis endpoint, liveness and readiness routes, request
//! tracing, CORS and per-call timeouts around a shared [`ModelHandle`].

mod cors;
mod health;
mod limits;
mod ready;

use std::net::SocketAddr;

use axum::Router;
use tower_http::trace::TraceLayer;
use tts::ModelHandle;
use vibevoice_config::Config;

pub use ready::READY_PATH;

/// Listen address used when none is configured
pub const DEFAULT_LISTEN_ADDRESS: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 8000);

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// The model does not need to be loaded yet: synthesis requests wait
    /// on `model` and the readiness probe reports its state.
    ///
    /// # Errors
    ///
    /// Returns an error if the request timeout or CORS max age cannot be parsed
    pub fn new(config: &Config, model: ModelHandle) -> anyhow::Result<Self> {
        let listen_address = config.server.listen_address.unwrap_or(DEFAULT_LISTEN_ADDRESS);

        let timeout = config.server.request_timeout_duration()?;

        let synthesis = tts::endpoint_router()
            .with_state(tts::build_service(config, model.clone()))
            .layer(axum::middleware::from_fn(move |req, next| {
                limits::synthesis_timeout_middleware(timeout, req, next)
            }));

        let mut app = Router::new()
            .route(READY_PATH, axum::routing::get(ready::ready_handler).with_state(model))
            .merge(synthesis);

        if config.server.health.enabled {
            app = app.route(&config.server.health.path, health::health_route(&config.server.service_name));
        }

        app = app.layer(TraceLayer::new_for_http());

        if let Some(cors_config) = &config.server.cors {
            app = app.layer(cors::cors_layer(cors_config)?);
        }

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
