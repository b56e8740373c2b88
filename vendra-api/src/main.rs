use std::net::SocketAddr;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vendra_api::{app, AppState};
use vendra_catalog::{
    CatalogStore, MarkupPolicy, MemoryCatalog, MemorySyncRuns, SyncRunStore,
};
use vendra_core::limiter::RateLimiterPool;
use vendra_core::retry::RetryPolicy;
use vendra_import::{CatalogImporter, ImportConfig, InventoryReconciler};
use vendra_order::{MemoryOrderMappings, OrderDispatcher, OrderMappingStore, OrderStatusService};
use vendra_store::{DbClient, PgCatalogStore, PgOrderMappings, PgSyncRuns};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vendra_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = vendra_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Vendra API on port {}", config.server.port);

    // Stores: Postgres when configured, in-memory otherwise.
    let (catalog, sync_runs, mappings): (
        Arc<dyn CatalogStore>,
        Arc<dyn SyncRunStore>,
        Arc<dyn OrderMappingStore>,
    ) = match &config.database {
        Some(database) => {
            let db = DbClient::new(&database.url)
                .await
                .expect("Failed to connect to Postgres");
            db.migrate().await.expect("Failed to run migrations");
            (
                Arc::new(PgCatalogStore::new(db.pool.clone())),
                Arc::new(PgSyncRuns::new(db.pool.clone())),
                Arc::new(PgOrderMappings::new(db.pool.clone())),
            )
        }
        None => {
            tracing::info!("No database configured; using in-memory stores");
            (
                Arc::new(MemoryCatalog::new()),
                Arc::new(MemorySyncRuns::new()),
                Arc::new(MemoryOrderMappings::new()),
            )
        }
    };

    // Adapters register only for providers with credentials; everything else
    // resolves to Unconfigured and the importer falls back.
    let registry = Arc::new(vendra_provider::build_registry(
        &config.providers,
        RetryPolicy::default(),
    ));
    if registry.is_empty() {
        tracing::warn!("No provider credentials configured; catalog syncs will use the fallback taxonomy");
    }

    let markup = Decimal::try_from(config.import.markup_factor)
        .map(MarkupPolicy::new)
        .unwrap_or_default();
    let limiter = Arc::new(RateLimiterPool::new(
        config.import.requests_per_minute,
        config.import.burst,
    ));
    let import_config = ImportConfig {
        markup: markup.clone(),
        page_size: config.import.page_size,
        max_pages: config.import.max_pages,
        max_concurrent: config.import.max_concurrent,
        category_limit: config.import.category_limit,
    };

    let importer = Arc::new(CatalogImporter::new(
        registry.clone(),
        catalog.clone(),
        sync_runs.clone(),
        limiter.clone(),
        import_config,
    ));
    let reconciler = Arc::new(InventoryReconciler::new(
        registry.clone(),
        catalog.clone(),
        sync_runs.clone(),
        limiter,
        markup,
    ));
    let dispatcher = Arc::new(OrderDispatcher::new(
        registry.clone(),
        catalog.clone(),
        mappings.clone(),
    ));
    let order_status = Arc::new(OrderStatusService::new(mappings));

    let app_state = AppState {
        registry,
        catalog,
        importer,
        reconciler,
        dispatcher,
        order_status,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
