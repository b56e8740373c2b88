use std::collections::HashMap;

use axum::{extract::State, routing::get, Json, Router};

use vendra_core::provider::HealthReport;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/providers/health", get(provider_health))
}

async fn healthz() -> &'static str {
    "ok"
}

/// GET /v1/providers/health: probe every registered adapter.
async fn provider_health(State(state): State<AppState>) -> Json<HashMap<String, HealthReport>> {
    Json(state.registry.health_snapshot().await)
}
