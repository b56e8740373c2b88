use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use vendra_catalog::{Category, Product};
use vendra_import::{CancelToken, ImportSummary, ReconcileOptions, ReconcileSummary, SyncOptions};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SyncRequest {
    /// Import products only into these category slugs.
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub category_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReconcileRequest {
    /// Only refresh products last updated more than this many minutes ago.
    #[serde(default)]
    pub refresh_older_than_minutes: Option<i64>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/tenants/{tenant}/categories", get(list_categories))
        .route("/v1/tenants/{tenant}/products", get(list_products))
        .route(
            "/v1/tenants/{tenant}/providers/{provider}/sync",
            post(sync_catalog),
        )
        .route(
            "/v1/tenants/{tenant}/providers/{provider}/reconcile",
            post(reconcile),
        )
}

/// GET /v1/tenants/{tenant}/categories
async fn list_categories(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = state
        .catalog
        .list_categories(&tenant)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(categories))
}

/// GET /v1/tenants/{tenant}/products
async fn list_products(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = state
        .catalog
        .list_products(&tenant)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(products))
}

/// POST /v1/tenants/{tenant}/providers/{provider}/sync
/// Run a catalog import for one tenant against one provider.
async fn sync_catalog(
    State(state): State<AppState>,
    Path((tenant, provider)): Path<(String, String)>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<ImportSummary>, AppError> {
    let opts = SyncOptions {
        categories: request.categories,
        category_limit: request.category_limit,
    };

    let summary = state
        .importer
        .sync_catalog(&tenant, &provider, &opts, &CancelToken::new())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(Json(summary))
}

/// POST /v1/tenants/{tenant}/providers/{provider}/reconcile
async fn reconcile(
    State(state): State<AppState>,
    Path((tenant, provider)): Path<(String, String)>,
    Json(request): Json<ReconcileRequest>,
) -> Result<Json<ReconcileSummary>, AppError> {
    let opts = ReconcileOptions {
        refresh_older_than: request
            .refresh_older_than_minutes
            .map(chrono::Duration::minutes),
    };

    let summary = state
        .reconciler
        .reconcile(&tenant, &provider, &opts, &CancelToken::new())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(Json(summary))
}
