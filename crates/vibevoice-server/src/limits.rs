use std::time::Duration;

use axum::{
    Json,
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tts::SynthesisResult;

/// Bound how long a synthesis call may keep the client waiting
///
/// Waiting for the model and for a free inference slot both count. A timed
/// out call still answers 200 with an `error` payload; inference that already
/// started runs to completion and keeps its slot until then.
pub async fn synthesis_timeout_middleware(timeout: Duration, request: Request, next: Next) -> Response {
    match tokio::time::timeout(timeout, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(?timeout, "synthesis request timed out");

            Json(SynthesisResult::error(format!(
                "Request timed out after {}s",
                timeout.as_secs_f64()
            )))
            .into_response()
        }
    }
}
