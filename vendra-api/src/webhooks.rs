use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use vendra_order::{MappingStatus, OrderError};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OrderStatusWebhook {
    pub external_order_id: String,
    pub status: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/v1/webhooks/providers/{provider}/orders",
        post(handle_order_status),
    )
}

/// POST /v1/webhooks/providers/{provider}/orders
/// Asynchronous order-status updates pushed by a provider.
async fn handle_order_status(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(payload): Json<OrderStatusWebhook>,
) -> Result<StatusCode, AppError> {
    tracing::info!(
        "Received order webhook from {}: {} -> {}",
        provider,
        payload.external_order_id,
        payload.status
    );

    let status = match payload.status.to_uppercase().as_str() {
        "SUBMITTED" => MappingStatus::Submitted,
        "FAILED" | "CANCELLED" | "REJECTED" => MappingStatus::Failed,
        other => {
            return Err(AppError::BadRequest(format!(
                "unsupported status: {}",
                other
            )))
        }
    };

    state
        .order_status
        .update_external_order_status(&provider, &payload.external_order_id, status)
        .await
        .map_err(|err| match err {
            OrderError::NotFound(msg) => AppError::NotFound(msg),
            OrderError::InvalidTransition { from, to } => {
                AppError::Conflict(format!("cannot move mapping from {} to {}", from, to))
            }
            other => AppError::Internal(other.to_string()),
        })?;

    Ok(StatusCode::OK)
}
