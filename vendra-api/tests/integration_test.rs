use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use vendra_api::{app, AppState};
use vendra_catalog::{CatalogStore, MarkupPolicy, MemoryCatalog, MemorySyncRuns};
use vendra_core::limiter::RateLimiterPool;
use vendra_core::provider::{
    DropshipOrder, HealthReport, InventoryAck, InventoryUpdate, OrderAddress, OrderCreation,
    OrderCustomer, ProductQuery, Provider, ProviderCategory, ProviderProduct, ShippingEstimate,
    ShippingSource,
};
use vendra_core::{ProviderRegistry, ProviderResult};
use vendra_import::{
    CancelToken, CatalogImporter, ImportConfig, InventoryReconciler, SyncOptions,
};
use vendra_order::{
    MappingStatus, MarketplaceOrder, MemoryOrderMappings, OrderDispatcher, OrderLine,
    OrderMappingStore, OrderStatusService,
};

/// Minimal scripted supplier: one category, one product, everything succeeds.
struct DemoProvider;

#[async_trait]
impl Provider for DemoProvider {
    fn name(&self) -> &str {
        "alibaba"
    }

    fn sku_prefix(&self) -> &str {
        "ALI"
    }

    async fn check_health(&self) -> HealthReport {
        HealthReport::healthy()
    }

    async fn get_categories(&self) -> ProviderResult<Vec<ProviderCategory>> {
        Ok(vec![ProviderCategory {
            id: "100".to_string(),
            name: "Electronics".to_string(),
            slug: "electronics".to_string(),
            parent_id: None,
            level: 0,
        }])
    }

    async fn fetch_products(&self, query: &ProductQuery) -> ProviderResult<Vec<ProviderProduct>> {
        if query.page > 1 {
            return Ok(Vec::new());
        }
        Ok(vec![ProviderProduct {
            id: "p1".to_string(),
            name: "USB Hub".to_string(),
            description: Some("7 ports".to_string()),
            price: Decimal::from_str("10.00").unwrap(),
            image_url: None,
            sku: None,
            stock: 25,
            variants: Vec::new(),
            supplier: None,
        }])
    }

    async fn create_order(&self, order: &DropshipOrder) -> ProviderResult<OrderCreation> {
        Ok(OrderCreation {
            external_order_id: format!("AE-{}", order.internal_order_id.simple()),
            status: "created".to_string(),
            payload: json!({ "items": order.items.len() }),
        })
    }

    async fn calculate_shipping(&self, _order: &DropshipOrder) -> ProviderResult<ShippingEstimate> {
        Ok(ShippingEstimate {
            cost: Decimal::from_str("4.20").unwrap(),
            estimated_delivery: chrono::Utc::now() + chrono::Duration::days(10),
            source: ShippingSource::Quoted,
        })
    }

    async fn update_inventory(&self, _updates: &[InventoryUpdate]) -> ProviderResult<InventoryAck> {
        Ok(InventoryAck::Unsupported)
    }
}

struct TestHarness {
    state: AppState,
    catalog: Arc<MemoryCatalog>,
    mappings: Arc<MemoryOrderMappings>,
}

fn harness() -> TestHarness {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(DemoProvider));
    let registry = Arc::new(registry);

    let catalog = Arc::new(MemoryCatalog::new());
    let sync_runs = Arc::new(MemorySyncRuns::new());
    let mappings = Arc::new(MemoryOrderMappings::new());
    let limiter = Arc::new(RateLimiterPool::new(6000, 100));

    let importer = Arc::new(CatalogImporter::new(
        registry.clone(),
        catalog.clone(),
        sync_runs.clone(),
        limiter.clone(),
        ImportConfig::default(),
    ));
    let reconciler = Arc::new(InventoryReconciler::new(
        registry.clone(),
        catalog.clone(),
        sync_runs,
        limiter,
        MarkupPolicy::default(),
    ));
    let dispatcher = Arc::new(OrderDispatcher::new(
        registry.clone(),
        catalog.clone(),
        mappings.clone(),
    ));
    let order_status = Arc::new(OrderStatusService::new(mappings.clone()));

    TestHarness {
        state: AppState {
            registry,
            catalog: catalog.clone(),
            importer,
            reconciler,
            dispatcher,
            order_status,
        },
        catalog,
        mappings,
    }
}

#[tokio::test]
async fn test_import_then_dispatch_flow() {
    let h = harness();

    // Import the demo catalog for tenant T1.
    let summary = h
        .state
        .importer
        .sync_catalog("T1", "alibaba", &SyncOptions::default(), &CancelToken::new())
        .await
        .unwrap();
    assert!(!summary.used_fallback);
    assert_eq!(summary.products_imported, 1);

    let product = h
        .catalog
        .find_dropship_product("T1", "alibaba", "p1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.sku, "ALI-p1");
    assert_eq!(product.price, Decimal::from_str("13.00").unwrap());

    let category = h.catalog.get_category("T1", "electronics").await.unwrap().unwrap();
    assert_eq!(category.product_count, 1);

    // Dispatch an order referencing the imported product.
    let order = MarketplaceOrder {
        id: Uuid::new_v4(),
        tenant_id: "T1".to_string(),
        customer: OrderCustomer {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
        },
        shipping_address: OrderAddress {
            line1: "1 Main St".to_string(),
            line2: None,
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            postal_code: "62701".to_string(),
            country: "US".to_string(),
        },
        lines: vec![OrderLine {
            product_id: product.id,
            quantity: 2,
            unit_price: product.price,
        }],
    };

    let report = h.state.dispatcher.dispatch("T1", &order).await.unwrap();
    assert_eq!(report.submitted, vec!["alibaba".to_string()]);
    assert!(report.shipping.contains_key("alibaba"));

    let stored = h.mappings.get_mappings(order.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, MappingStatus::Submitted);
}

#[tokio::test]
async fn test_healthz_route() {
    let h = harness();
    let response = app(h.state)
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_sync_route_returns_summary() {
    let h = harness();
    let response = app(h.state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/tenants/T1/providers/alibaba/sync")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let summary: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(summary["tenant_id"], "T1");
    assert_eq!(summary["products_imported"], 1);
    assert_eq!(summary["used_fallback"], false);
}

#[tokio::test]
async fn test_webhook_updates_mapping_status() {
    let h = harness();

    // Import and dispatch first so a mapping exists.
    h.state
        .importer
        .sync_catalog("T1", "alibaba", &SyncOptions::default(), &CancelToken::new())
        .await
        .unwrap();
    let product = h
        .catalog
        .find_dropship_product("T1", "alibaba", "p1")
        .await
        .unwrap()
        .unwrap();

    let order = MarketplaceOrder {
        id: Uuid::new_v4(),
        tenant_id: "T1".to_string(),
        customer: OrderCustomer {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
        },
        shipping_address: OrderAddress {
            line1: "1 Main St".to_string(),
            line2: None,
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            postal_code: "62701".to_string(),
            country: "US".to_string(),
        },
        lines: vec![OrderLine {
            product_id: product.id,
            quantity: 1,
            unit_price: product.price,
        }],
    };
    h.state.dispatcher.dispatch("T1", &order).await.unwrap();

    let external_id = h.mappings.get_mappings(order.id).await.unwrap()[0]
        .external_order_id
        .clone()
        .unwrap();

    let response = app(h.state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/webhooks/providers/alibaba/orders")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "external_order_id": external_id, "status": "cancelled" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mapping = h
        .mappings
        .find_by_external("alibaba", &external_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(mapping.status, MappingStatus::Failed);
}

#[tokio::test]
async fn test_webhook_unknown_order_is_404() {
    let h = harness();
    let response = app(h.state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/webhooks/providers/alibaba/orders")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "external_order_id": "missing", "status": "failed" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
