use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::json;
use vendra_core::provider::{HealthStatus, ProductQuery, Provider, ShippingSource};
use vendra_core::{ProviderCredentials, ProviderError};
use vendra_provider::AlibabaProvider;
use vendra_shared::Masked;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_for(server: &MockServer) -> AlibabaProvider {
    AlibabaProvider::new(ProviderCredentials {
        api_key: "test-key".to_string(),
        app_secret: Masked("test-secret".to_string()),
        access_token: None,
        base_url: Some(server.uri()),
    })
}

#[tokio::test]
async fn fetch_products_maps_items_and_skips_malformed_records() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products"))
        .and(query_param("category_id", "100"))
        .and(query_param("page", "1"))
        .and(query_param("page_size", "40"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "item_id": "p1", "subject": "USB Hub", "price": "10.00", "stock": 12 },
                { "item_id": "broken", "subject": "No price" },
                { "item_id": "p2", "subject": "HDMI Cable", "price": "3.50", "stock": 0 }
            ],
            "total": 3
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let products = provider
        .fetch_products(&ProductQuery::by_category("100", 1, 40))
        .await
        .unwrap();

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].id, "p1");
    assert_eq!(products[0].price, Decimal::from_str("10.00").unwrap());
    assert_eq!(products[1].stock, 0);
}

#[tokio::test]
async fn requests_carry_key_timestamp_and_signature() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/categories"))
        .and(query_param("app_key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "categories": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    provider.get_categories().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let query = requests[0].url.query().unwrap_or("");
    assert!(query.contains("timestamp="));
    assert!(query.contains("sign="));
}

#[tokio::test]
async fn auth_failures_are_typed_and_not_invented_away() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/categories"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let result = provider.get_categories().await;
    assert!(matches!(result, Err(ProviderError::Auth(_))));
}

#[tokio::test]
async fn rate_limit_surfaces_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let result = provider
        .fetch_products(&ProductQuery::by_keyword("hub", 1, 40))
        .await;

    match result {
        Err(ProviderError::RateLimited { retry_after }) => {
            assert_eq!(retry_after, Some(std::time::Duration::from_secs(7)));
        }
        other => panic!("expected rate-limited error, got {:?}", other.map(|v| v.len())),
    }
}

#[tokio::test]
async fn shipping_falls_back_when_logistics_is_down() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/logistics/estimate"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let order = sample_order();
    let estimate = provider.calculate_shipping(&order).await.unwrap();

    assert_eq!(estimate.source, ShippingSource::Fallback);
    assert!(estimate.cost > Decimal::ZERO);
}

#[tokio::test]
async fn create_order_returns_external_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "order_id": "AE-20240101-77",
            "status": "created"
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let creation = provider.create_order(&sample_order()).await.unwrap();
    assert_eq!(creation.external_order_id, "AE-20240101-77");
}

#[tokio::test]
async fn health_check_never_errors() {
    let server = MockServer::start().await;
    // No mock mounted: the request 404s, which must come back as a report,
    // not an error.
    let provider = provider_for(&server);
    let report = provider.check_health().await;
    assert_eq!(report.status, HealthStatus::Unreachable);
}

fn sample_order() -> vendra_core::provider::DropshipOrder {
    use uuid::Uuid;
    use vendra_core::provider::{DropshipOrder, DropshipOrderItem, OrderAddress, OrderCustomer};

    DropshipOrder {
        internal_order_id: Uuid::new_v4(),
        tenant_id: "t1".to_string(),
        customer: OrderCustomer {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: Some("+1-555-0100".to_string()),
        },
        address: OrderAddress {
            line1: "1 Main St".to_string(),
            line2: None,
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            postal_code: "62701".to_string(),
            country: "US".to_string(),
        },
        items: vec![DropshipOrderItem {
            external_product_id: "p1".to_string(),
            sku: "ALI-p1".to_string(),
            name: "USB Hub".to_string(),
            quantity: 1,
            unit_price: Decimal::from_str("13.00").unwrap(),
        }],
    }
}
