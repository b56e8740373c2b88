use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vendra_shared::slugify;

/// Stock tracking embedded in a product record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    pub quantity: i32,
    pub low_stock_threshold: i32,
    pub in_stock: bool,
}

impl Inventory {
    pub fn new(quantity: i32, low_stock_threshold: i32) -> Self {
        Self {
            quantity,
            low_stock_threshold,
            in_stock: quantity > 0,
        }
    }

    /// Update the quantity, keeping `in_stock` consistent.
    pub fn set_quantity(&mut self, quantity: i32) {
        self.quantity = quantity;
        self.in_stock = quantity > 0;
    }

    pub fn is_low_stock(&self) -> bool {
        self.in_stock && self.quantity <= self.low_stock_threshold
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    pub name: String,
    pub value: String,
    pub price: Option<Decimal>,
}

/// A tenant-scoped catalog item.
///
/// For dropship products the triple `(tenant_id, dropship_provider,
/// dropship_product_id)` is the idempotency key: re-importing the same
/// provider product updates this record, never duplicates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    /// Retail price: always supplier price × markup factor, 2 dp.
    pub price: Decimal,
    pub list_price: Decimal,
    pub category_slug: String,
    pub sku: String,
    pub images: Vec<String>,
    pub inventory: Inventory,
    pub is_active: bool,
    pub is_dropship: bool,
    pub dropship_provider: Option<String>,
    pub dropship_product_id: Option<String>,
    pub tags: Vec<String>,
    pub variants: Vec<ProductVariant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Create a dropship product shell; pricing and inventory are filled in
    /// by the importer transform.
    pub fn new_dropship(
        tenant_id: impl Into<String>,
        name: impl Into<String>,
        category_slug: impl Into<String>,
        provider: impl Into<String>,
        external_id: impl Into<String>,
        sku: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let external_id = external_id.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.into(),
            // External ids keep name-collision products distinct per tenant.
            slug: slugify(&format!("{}-{}", name, external_id)),
            name,
            description: None,
            price: Decimal::ZERO,
            list_price: Decimal::ZERO,
            category_slug: category_slug.into(),
            sku: sku.into(),
            images: Vec::new(),
            inventory: Inventory::new(0, 5),
            is_active: true,
            is_dropship: true,
            dropship_provider: Some(provider.into()),
            dropship_product_id: Some(external_id),
            tags: Vec::new(),
            variants: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The idempotency key, present only for well-formed dropship products.
    pub fn source_key(&self) -> Option<(&str, &str, &str)> {
        if !self.is_dropship {
            return None;
        }
        match (&self.dropship_provider, &self.dropship_product_id) {
            (Some(provider), Some(external_id)) => {
                Some((self.tenant_id.as_str(), provider.as_str(), external_id.as_str()))
            }
            _ => None,
        }
    }
}
