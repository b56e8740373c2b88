use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use vendra_core::provider::{
    DropshipOrder, HealthReport, InventoryAck, InventoryUpdate, OrderCreation, ProductQuery,
    Provider, ProviderCategory, ProviderProduct, ShippingEstimate, ShippingSource,
};
use vendra_core::{ProviderError, ProviderResult};
use vendra_shared::slugify;

/// Scripted in-memory provider for importer and reconciler tests.
pub struct StubProvider {
    name: String,
    prefix: String,
    categories: Vec<ProviderCategory>,
    products: HashMap<String, Vec<ProviderProduct>>,
    fail_categories: bool,
    fail_products_in: HashSet<String>,
}

impl StubProvider {
    pub fn new(name: &str, prefix: &str) -> Self {
        Self {
            name: name.to_string(),
            prefix: prefix.to_string(),
            categories: Vec::new(),
            products: HashMap::new(),
            fail_categories: false,
            fail_products_in: HashSet::new(),
        }
    }

    pub fn with_category(mut self, id: &str, name: &str) -> Self {
        self.categories.push(ProviderCategory {
            id: id.to_string(),
            name: name.to_string(),
            slug: slugify(name),
            parent_id: None,
            level: 0,
        });
        self
    }

    pub fn with_product(
        mut self,
        category_id: &str,
        id: &str,
        name: &str,
        price: &str,
        stock: i32,
    ) -> Self {
        self.products
            .entry(category_id.to_string())
            .or_default()
            .push(ProviderProduct {
                id: id.to_string(),
                name: name.to_string(),
                description: None,
                price: Decimal::from_str(price).unwrap(),
                image_url: None,
                sku: None,
                stock,
                variants: Vec::new(),
                supplier: None,
            });
        self
    }

    pub fn failing_categories(mut self) -> Self {
        self.fail_categories = true;
        self
    }

    pub fn failing_products_in(mut self, category_id: &str) -> Self {
        self.fail_products_in.insert(category_id.to_string());
        self
    }
}

#[async_trait]
impl Provider for StubProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn sku_prefix(&self) -> &str {
        &self.prefix
    }

    async fn check_health(&self) -> HealthReport {
        HealthReport::healthy()
    }

    async fn get_categories(&self) -> ProviderResult<Vec<ProviderCategory>> {
        if self.fail_categories {
            return Err(ProviderError::Unreachable("category endpoint down".into()));
        }
        Ok(self.categories.clone())
    }

    async fn fetch_products(&self, query: &ProductQuery) -> ProviderResult<Vec<ProviderProduct>> {
        if query.page > 1 {
            return Ok(Vec::new());
        }

        if let Some(category_id) = &query.category_id {
            if self.fail_products_in.contains(category_id) {
                return Err(ProviderError::Unreachable("product endpoint down".into()));
            }
            return Ok(self.products.get(category_id).cloned().unwrap_or_default());
        }

        if let Some(keyword) = &query.keyword {
            let matches: Vec<ProviderProduct> = self
                .products
                .values()
                .flatten()
                .filter(|p| p.id == *keyword || p.name.contains(keyword.as_str()))
                .cloned()
                .collect();
            return Ok(matches);
        }

        Ok(Vec::new())
    }

    async fn create_order(&self, order: &DropshipOrder) -> ProviderResult<OrderCreation> {
        Ok(OrderCreation {
            external_order_id: format!("EXT-{}", order.internal_order_id.simple()),
            status: "created".to_string(),
            payload: json!({ "accepted_items": order.items.len() }),
        })
    }

    async fn calculate_shipping(&self, _order: &DropshipOrder) -> ProviderResult<ShippingEstimate> {
        Ok(ShippingEstimate {
            cost: Decimal::new(500, 2),
            estimated_delivery: Utc::now() + Duration::days(7),
            source: ShippingSource::Quoted,
        })
    }

    async fn update_inventory(&self, _updates: &[InventoryUpdate]) -> ProviderResult<InventoryAck> {
        Ok(InventoryAck::Unsupported)
    }
}
