use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    inference_mode: &'static str,
    catalog_size: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub inference: HealthCheck,
    pub checked_at: String,
}

pub fn router(inference_mode: &'static str, catalog_size: usize) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { inference_mode, catalog_size })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let inference = match state.inference_mode {
        "remote" => HealthCheck {
            status: "ready",
            detail: "hosted inference configured; simulated replies on failure".to_string(),
        },
        _ => HealthCheck {
            status: "degraded",
            detail: "no inference credential configured; serving simulated replies".to_string(),
        },
    };

    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: format!("shopbot-server runtime initialized with {} products", state.catalog_size),
        },
        inference,
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}
