use axum::{Json, routing::MethodRouter};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: String,
}

/// Liveness route; answers regardless of model state
pub fn health_route(service_name: &str) -> MethodRouter {
    let body = HealthResponse {
        status: "ok",
        service: service_name.to_string(),
    };

    axum::routing::get(move || {
        let body = body.clone();
        async move { Json(body) }
    })
}
