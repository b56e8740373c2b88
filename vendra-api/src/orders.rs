use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use vendra_order::{
    DispatchReport, ExternalOrderMapping, MarketplaceOrder, OrderError, OrderMappingStore,
};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/tenants/{tenant}/orders/dispatch", post(dispatch_order))
        .route(
            "/v1/tenants/{tenant}/orders/{order_id}/mappings",
            get(list_mappings),
        )
}

/// POST /v1/tenants/{tenant}/orders/dispatch
/// Send an internal order's dropship lines to their providers. A
/// multi-supplier order may come back partially submitted.
async fn dispatch_order(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    Json(order): Json<MarketplaceOrder>,
) -> Result<Json<DispatchReport>, AppError> {
    let report = state
        .dispatcher
        .dispatch(&tenant, &order)
        .await
        .map_err(|err| match err {
            OrderError::InvalidOrder(msg) => AppError::BadRequest(msg),
            other => AppError::Internal(other.to_string()),
        })?;
    Ok(Json(report))
}

/// GET /v1/tenants/{tenant}/orders/{order_id}/mappings
async fn list_mappings(
    State(state): State<AppState>,
    Path((_tenant, order_id)): Path<(String, Uuid)>,
) -> Result<Json<Vec<ExternalOrderMapping>>, AppError> {
    let mappings = state
        .dispatcher
        .mappings()
        .get_mappings(order_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(mappings))
}
