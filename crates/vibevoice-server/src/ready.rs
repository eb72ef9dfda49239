use axum::{Json, extract::State, response::IntoResponse};
use http::StatusCode;
use serde::Serialize;
use tts::{FamilyKind, ModelHandle, ModelState};

/// Path of the readiness probe
pub const READY_PATH: &str = "/ready";

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Readiness {
    Ready { model_family: FamilyKind, device: String },
    Loading,
    Failed { error: String },
}

/// Readiness probe: 200 once a model is loaded, 503 otherwise
pub async fn ready_handler(State(model): State<ModelHandle>) -> impl IntoResponse {
    match model.state() {
        ModelState::Ready(context) => (
            StatusCode::OK,
            Json(Readiness::Ready {
                model_family: context.kind(),
                device: context.device().to_string(),
            }),
        ),
        ModelState::Loading => (StatusCode::SERVICE_UNAVAILABLE, Json(Readiness::Loading)),
        ModelState::Failed(error) => (StatusCode::SERVICE_UNAVAILABLE, Json(Readiness::Failed { error })),
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    async fn probe(model: ModelHandle) -> (StatusCode, serde_json::Value) {
        let app = Router::new().route(READY_PATH, get(ready_handler)).with_state(model);
        let response = app
            .oneshot(http::Request::get(READY_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn loading_model_is_not_ready() {
        let (status, body) = probe(ModelHandle::new()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, serde_json::json!({"status": "loading"}));
    }

    #[tokio::test]
    async fn failed_model_reports_reason() {
        let model = ModelHandle::new();
        model.set_failed("both families failed");

        let (status, body) = probe(model).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, serde_json::json!({"status": "failed", "error": "both families failed"}));
    }
}
