use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ProviderResult;

/// Provider liveness as reported by a cheap probe call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unreachable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub detail: Option<String>,
}

impl HealthReport {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            detail: None,
        }
    }

    pub fn unreachable(detail: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unreachable,
            detail: Some(detail.into()),
        }
    }
}

/// A category as the supplier exposes it, before tenant mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCategory {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<String>,
    pub level: i32,
}

/// Parameters for a paged product lookup.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub keyword: Option<String>,
    pub category_id: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl ProductQuery {
    pub fn by_category(category_id: impl Into<String>, page: u32, page_size: u32) -> Self {
        Self {
            keyword: None,
            category_id: Some(category_id.into()),
            page,
            page_size,
        }
    }

    pub fn by_keyword(keyword: impl Into<String>, page: u32, page_size: u32) -> Self {
        Self {
            keyword: Some(keyword.into()),
            category_id: None,
            page,
            page_size,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderVariant {
    pub name: String,
    pub value: String,
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierInfo {
    pub id: String,
    pub name: String,
    pub rating: Option<f64>,
}

/// A product as the supplier exposes it, before markup and tenant mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProduct {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub sku: Option<String>,
    pub stock: i32,
    pub variants: Vec<ProviderVariant>,
    pub supplier: Option<SupplierInfo>,
}

/// Customer details forwarded to the supplier with an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAddress {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropshipOrderItem {
    pub external_product_id: String,
    pub sku: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// The provider-facing slice of an internal order: only the line items this
/// provider fulfills, plus delivery details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropshipOrder {
    pub internal_order_id: Uuid,
    pub tenant_id: String,
    pub customer: OrderCustomer,
    pub address: OrderAddress,
    pub items: Vec<DropshipOrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreation {
    pub external_order_id: String,
    pub status: String,
    pub payload: Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingSource {
    /// Quoted by the provider's logistics endpoint.
    Quoted,
    /// Flat default used when the logistics endpoint was unavailable.
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingEstimate {
    pub cost: Decimal,
    pub estimated_delivery: DateTime<Utc>,
    pub source: ShippingSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryUpdate {
    pub external_product_id: String,
    pub quantity: i32,
}

/// Outcome of pushing inventory levels to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryAck {
    Applied(usize),
    /// The provider is read-only for dropship inventory. Distinct from a
    /// silent no-op so the reconciler can tell "nothing to do" from "not
    /// implemented".
    Unsupported,
}

/// The capability contract every supplier integration implements.
///
/// Each operation is independently callable and individually failable.
/// Adapters stay honest about failure: `get_categories` surfaces errors
/// instead of inventing data; the fallback-to-defaults policy belongs to
/// the catalog importer, not the adapter.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Registry key for this provider, e.g. "alibaba".
    fn name(&self) -> &str;

    /// Short code prefixed to generated SKUs, e.g. "ALI".
    fn sku_prefix(&self) -> &str;

    /// Probe the provider. Never errors; callers use the report to
    /// short-circuit before expensive calls.
    async fn check_health(&self) -> HealthReport;

    /// List the provider's category tree.
    async fn get_categories(&self) -> ProviderResult<Vec<ProviderCategory>>;

    /// Paged product lookup. Deterministic for identical
    /// (category_id, page, page_size) on a stable catalog.
    async fn fetch_products(&self, query: &ProductQuery) -> ProviderResult<Vec<ProviderProduct>>;

    /// Create a provider-side order for the given line items.
    async fn create_order(&self, order: &DropshipOrder) -> ProviderResult<OrderCreation>;

    /// Estimate shipping cost and delivery date. Adapters degrade to a flat
    /// fallback estimate instead of failing when logistics is unavailable.
    async fn calculate_shipping(&self, order: &DropshipOrder) -> ProviderResult<ShippingEstimate>;

    /// Push inventory levels back to the provider.
    async fn update_inventory(&self, updates: &[InventoryUpdate]) -> ProviderResult<InventoryAck>;
}
