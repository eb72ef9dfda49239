#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::path::Path;

use anyhow::Context;
use args::{Args, DEFAULT_CONFIG_PATH};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tts::{HubModelLoader, ModelHandle};
use vibevoice_config::Config;
use vibevoice_server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.server.listen_address = Some(listen);
    }

    // Initialize telemetry
    let _telemetry_guard = vibevoice_telemetry::init(config.telemetry.as_ref(), &args.log_filter)?;

    tracing::info!(
        service = %config.server.service_name,
        device = %config.model.device,
        "starting vibevoice"
    );

    let model = ModelHandle::new();
    let server = Server::new(&config, model.clone())?;

    // Set up graceful shutdown
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_clone.cancel();
    });

    // Load models once, in the background; a double failure stops the server
    let loader = HubModelLoader::new(config.model.clone());
    let load_shutdown = shutdown.clone();
    let load_failed = CancellationToken::new();
    let load_failed_clone = load_failed.clone();
    let loading = tokio::spawn(async move {
        let result = model.load(loader).await;
        if result.is_err() {
            load_failed_clone.cancel();
            load_shutdown.cancel();
        }
        result
    });

    server.serve(shutdown).await?;

    if load_failed.is_cancelled() || loading.is_finished() {
        loading
            .await
            .context("model loading task panicked")?
            .context("speech model failed to load")?;
    } else {
        loading.abort();
    }

    tracing::info!("vibevoice stopped");
    Ok(())
}

/// Read the config file, or run on defaults when the default file is absent
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(Path::new(DEFAULT_CONFIG_PATH)),
        None => Ok(Config::default()),
    }
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
