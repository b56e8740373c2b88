use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use vendra_core::provider::{
    DropshipOrder, HealthReport, HealthStatus, InventoryAck, InventoryUpdate, OrderCreation,
    ProductQuery, Provider, ProviderCategory, ProviderProduct, ProviderVariant, ShippingEstimate,
    ShippingSource, SupplierInfo,
};
use vendra_core::{ProviderCredentials, ProviderError, ProviderResult};
use vendra_shared::slugify;

use crate::client::SignedClient;
use crate::signing::HmacSigner;

const DEFAULT_BASE_URL: &str = "https://openapi.alibaba.example.com";

/// Flat estimate used when the logistics endpoint is down: cross-border
/// economy line, roughly two weeks.
const FALLBACK_SHIPPING_DAYS: i64 = 14;

fn fallback_shipping_cost() -> Decimal {
    // 9.90
    Decimal::new(990, 2)
}

/// Adapter for the Alibaba dropship open API: signed GET/POST requests,
/// paged product search, category-id translation, order placement.
/// Inventory is read-only on this provider.
pub struct AlibabaProvider {
    client: SignedClient,
}

impl AlibabaProvider {
    pub fn new(credentials: ProviderCredentials) -> Self {
        let base_url = credentials
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let signer = Arc::new(HmacSigner::new(credentials.app_secret.expose().clone()));
        Self {
            client: SignedClient::new(base_url, credentials.api_key, signer),
        }
    }
}

fn parse_price(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s).ok(),
        Value::Number(n) => n
            .as_f64()
            .and_then(|f| Decimal::try_from(f).ok())
            .map(vendra_shared::retail_round),
        _ => None,
    }
}

fn map_category(raw: &Value) -> Option<ProviderCategory> {
    let id = raw["category_id"].as_str()?.to_string();
    let name = raw["name"].as_str()?.to_string();
    let parent_id = raw["parent_id"].as_str().map(|s| s.to_string());
    let level = raw["level"].as_i64().unwrap_or(0) as i32;
    Some(ProviderCategory {
        slug: slugify(&name),
        id,
        name,
        parent_id,
        level,
    })
}

fn map_variant(raw: &Value) -> Option<ProviderVariant> {
    Some(ProviderVariant {
        name: raw["name"].as_str()?.to_string(),
        value: raw["value"].as_str()?.to_string(),
        price: parse_price(&raw["price"]),
    })
}

fn map_supplier(raw: &Value) -> Option<SupplierInfo> {
    Some(SupplierInfo {
        id: raw["supplier_id"].as_str()?.to_string(),
        name: raw["name"].as_str().unwrap_or("").to_string(),
        rating: raw["rating"].as_f64(),
    })
}

fn map_product(raw: &Value) -> Result<ProviderProduct, String> {
    let id = raw["item_id"]
        .as_str()
        .ok_or("item_id missing")?
        .to_string();
    let name = raw["subject"]
        .as_str()
        .ok_or("subject missing")?
        .to_string();
    let price = parse_price(&raw["price"]).ok_or("price missing or malformed")?;

    let variants = raw["variants"]
        .as_array()
        .map(|items| items.iter().filter_map(map_variant).collect())
        .unwrap_or_default();

    Ok(ProviderProduct {
        id,
        name,
        description: raw["detail"].as_str().map(|s| s.to_string()),
        price,
        image_url: raw["main_image"].as_str().map(|s| s.to_string()),
        sku: raw["sku_code"].as_str().map(|s| s.to_string()),
        stock: raw["stock"].as_i64().unwrap_or(0) as i32,
        variants,
        supplier: map_supplier(&raw["supplier"]),
    })
}

fn order_payload(order: &DropshipOrder) -> Value {
    json!({
        "out_order_no": order.internal_order_id.to_string(),
        "consignee": {
            "name": order.customer.name,
            "email": order.customer.email,
            "phone": order.customer.phone,
        },
        "address": {
            "line1": order.address.line1,
            "line2": order.address.line2,
            "city": order.address.city,
            "state": order.address.state,
            "zip": order.address.postal_code,
            "country": order.address.country,
        },
        "items": order
            .items
            .iter()
            .map(|item| json!({ "item_id": item.external_product_id, "quantity": item.quantity }))
            .collect::<Vec<_>>(),
    })
}

#[async_trait]
impl Provider for AlibabaProvider {
    fn name(&self) -> &str {
        "alibaba"
    }

    fn sku_prefix(&self) -> &str {
        "ALI"
    }

    async fn check_health(&self) -> HealthReport {
        match self.client.get_json("/api/v1/health", BTreeMap::new()).await {
            Ok(body) => match body["status"].as_str() {
                Some("ok") => HealthReport::healthy(),
                Some(other) => HealthReport {
                    status: HealthStatus::Degraded,
                    detail: Some(other.to_string()),
                },
                None => HealthReport {
                    status: HealthStatus::Degraded,
                    detail: Some("health payload missing status".to_string()),
                },
            },
            Err(err) => HealthReport::unreachable(err.to_string()),
        }
    }

    async fn get_categories(&self) -> ProviderResult<Vec<ProviderCategory>> {
        let body = self
            .client
            .get_json("/api/v1/categories", BTreeMap::new())
            .await?;

        let raw = body["categories"]
            .as_array()
            .ok_or_else(|| ProviderError::Data("categories payload is not a list".to_string()))?;

        let mut categories = Vec::with_capacity(raw.len());
        for item in raw {
            match map_category(item) {
                Some(category) => categories.push(category),
                None => tracing::warn!("Skipping malformed category record: {}", item),
            }
        }
        Ok(categories)
    }

    async fn fetch_products(&self, query: &ProductQuery) -> ProviderResult<Vec<ProviderProduct>> {
        let mut params = BTreeMap::new();
        params.insert("page".to_string(), query.page.to_string());
        params.insert("page_size".to_string(), query.page_size.to_string());
        if let Some(keyword) = &query.keyword {
            params.insert("keyword".to_string(), keyword.clone());
        }
        if let Some(category_id) = &query.category_id {
            params.insert("category_id".to_string(), category_id.clone());
        }

        let body = self.client.get_json("/api/v1/products", params).await?;
        let raw = body["items"]
            .as_array()
            .ok_or_else(|| ProviderError::Data("products payload is not a list".to_string()))?;

        let mut products = Vec::with_capacity(raw.len());
        for item in raw {
            match map_product(item) {
                Ok(product) => products.push(product),
                // One bad record never sinks the page.
                Err(reason) => tracing::warn!("Skipping malformed product record: {}", reason),
            }
        }
        Ok(products)
    }

    async fn create_order(&self, order: &DropshipOrder) -> ProviderResult<OrderCreation> {
        let body = self
            .client
            .post_json("/api/v1/orders", BTreeMap::new(), &order_payload(order))
            .await
            .map_err(|err| match err {
                // Transport failures keep their kind; payload rejections are
                // order errors for the dispatcher to record.
                ProviderError::Data(detail) => ProviderError::Order(detail),
                other => other,
            })?;

        let external_order_id = body["order_id"]
            .as_str()
            .ok_or_else(|| ProviderError::Order("response missing order_id".to_string()))?
            .to_string();
        let status = body["status"].as_str().unwrap_or("created").to_string();

        Ok(OrderCreation {
            external_order_id,
            status,
            payload: body,
        })
    }

    async fn calculate_shipping(&self, order: &DropshipOrder) -> ProviderResult<ShippingEstimate> {
        let result = self
            .client
            .post_json(
                "/api/v1/logistics/estimate",
                BTreeMap::new(),
                &order_payload(order),
            )
            .await;

        match result {
            Ok(body) => {
                let cost = parse_price(&body["fee"]).unwrap_or_else(fallback_shipping_cost);
                let days = body["delivery_days"]
                    .as_i64()
                    .unwrap_or(FALLBACK_SHIPPING_DAYS);
                Ok(ShippingEstimate {
                    cost,
                    estimated_delivery: Utc::now() + Duration::days(days),
                    source: ShippingSource::Quoted,
                })
            }
            Err(ProviderError::Auth(detail)) => Err(ProviderError::Auth(detail)),
            Err(err) => {
                tracing::warn!(
                    "Logistics estimate unavailable ({}); using flat fallback",
                    err
                );
                Ok(ShippingEstimate {
                    cost: fallback_shipping_cost(),
                    estimated_delivery: Utc::now() + Duration::days(FALLBACK_SHIPPING_DAYS),
                    source: ShippingSource::Fallback,
                })
            }
        }
    }

    async fn update_inventory(&self, _updates: &[InventoryUpdate]) -> ProviderResult<InventoryAck> {
        // The dropship API exposes no inventory write endpoint. Explicitly
        // unsupported, so the reconciler can tell this from "applied".
        Ok(InventoryAck::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_product_parses_wire_fields() {
        let raw = json!({
            "item_id": "p1",
            "subject": "USB Hub",
            "detail": "7 ports",
            "price": "10.00",
            "main_image": "https://img.example.com/p1.jpg",
            "stock": 37,
            "variants": [{ "name": "Color", "value": "Black", "price": "10.50" }],
            "supplier": { "supplier_id": "s1", "name": "Shenzhen Hub Co", "rating": 4.7 }
        });

        let product = map_product(&raw).unwrap();
        assert_eq!(product.id, "p1");
        assert_eq!(product.price, Decimal::from_str("10.00").unwrap());
        assert_eq!(product.stock, 37);
        assert_eq!(product.variants.len(), 1);
        assert_eq!(product.supplier.as_ref().unwrap().id, "s1");
    }

    #[test]
    fn test_map_product_rejects_missing_price() {
        let raw = json!({ "item_id": "p1", "subject": "USB Hub" });
        assert!(map_product(&raw).is_err());
    }

    #[test]
    fn test_map_category_slugifies_name() {
        let raw = json!({
            "category_id": "100",
            "name": "Consumer Electronics",
            "parent_id": null,
            "level": 0
        });
        let category = map_category(&raw).unwrap();
        assert_eq!(category.slug, "consumer-electronics");
        assert_eq!(category.parent_id, None);
    }

    #[test]
    fn test_order_payload_shape() {
        use uuid::Uuid;
        use vendra_core::provider::{DropshipOrderItem, OrderAddress, OrderCustomer};

        let order = DropshipOrder {
            internal_order_id: Uuid::new_v4(),
            tenant_id: "t1".to_string(),
            customer: OrderCustomer {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                phone: None,
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
                quantity: 2,
                unit_price: Decimal::from_str("13.00").unwrap(),
            }],
        };

        let payload = order_payload(&order);
        assert_eq!(payload["items"][0]["item_id"], "p1");
        assert_eq!(payload["items"][0]["quantity"], 2);
        assert_eq!(payload["consignee"]["name"], "Ada");
    }
}
