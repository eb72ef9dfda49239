//! Text-to-speech engine and its `POST /tts` endpoint
//!
//! Models are loaded once into a [`ModelContext`] behind a [`ModelHandle`].
//! Synthesis always answers with a [`SynthesisResult`]; failures travel in
//! the payload rather than the status code.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod artifact;
mod device;
mod error;
mod lifecycle;
mod loader;
mod model;
mod onnx;
mod preprocess;
mod request;
mod speaker;
mod synthesizer;
mod types;
mod wav;

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use tokio::sync::Semaphore;

pub use artifact::ArtifactFetcher;
pub use device::ComputeDevice;
pub use error::{Result, TtsError};
pub use lifecycle::{ModelHandle, ModelState};
pub use loader::{FamilyLoader, HubModelLoader, LoadOutcome, load_model};
pub use model::{
    FALLBACK_SAMPLE_RATE, FamilyKind, ModelContext, ModelFamily, Spectrogram, SpectrogramModel, Vocoder,
    WaveformModel,
};
pub use preprocess::Preprocessor;
pub use request::ExtractPayload;
pub use speaker::SpeakerEmbedding;
pub use synthesizer::{prepare_text, synthesize};
pub use types::{SynthesisRequest, SynthesisResult};
pub use wav::encode_wav;

/// Path of the synthesis endpoint
pub const SYNTHESIS_PATH: &str = "/tts";

/// Shared state of the synthesis endpoint
pub struct Service {
    model: ModelHandle,
    max_text_chars: usize,
    permits: Arc<Semaphore>,
}

impl Service {
    /// Create the service, allowing at most `max_concurrent` inferences at once
    pub fn new(model: ModelHandle, max_text_chars: usize, max_concurrent: usize) -> Self {
        Self {
            model,
            max_text_chars,
            permits: Arc::new(Semaphore::new(max_concurrent.clamp(1, Semaphore::MAX_PERMITS))),
        }
    }

    /// Wait for the model and a free slot, then synthesize on the blocking pool
    ///
    /// The slot is held by the blocking task, so it stays taken until inference
    /// returns even when the caller stops waiting.
    pub async fn synthesize(&self, text: String) -> SynthesisResult {
        let context = match self.model.wait_ready().await {
            Ok(context) => context,
            Err(reason) => return SynthesisResult::error(format!("Model unavailable: {reason}")),
        };

        let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
            return SynthesisResult::error("Service is shutting down");
        };

        let max_text_chars = self.max_text_chars;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            synthesizer::synthesize(&context, &text, max_text_chars)
        })
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "synthesis task aborted");
            SynthesisResult::error(format!("Synthesis task failed: {e}"))
        })
    }
}

/// Build the synthesis service from configuration
pub fn build_service(config: &vibevoice_config::Config, model: ModelHandle) -> Arc<Service> {
    Arc::new(Service::new(
        model,
        config.model.max_text_chars,
        config.server.max_concurrent_requests,
    ))
}

/// Create the endpoint router for synthesis
pub fn endpoint_router() -> Router<Arc<Service>> {
    Router::new().route(SYNTHESIS_PATH, post(synthesize_handler))
}

async fn synthesize_handler(
    State(service): State<Arc<Service>>,
    ExtractPayload(request): ExtractPayload<SynthesisRequest>,
) -> Json<SynthesisResult> {
    tracing::debug!(chars = request.text.chars().count(), "synthesis request received");

    Json(service.synthesize(request.text).await)
}
