use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::category::Category;
use crate::product::Product;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Two distinct records claim the same (tenant, provider, external id)
    /// key. Impossible by design; if it surfaces, a data-modeling bug slipped
    /// in and it must be loud, never swallowed.
    #[error("Idempotency key conflict: {0}")]
    IdempotencyConflict(String),

    #[error("Storage failure: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Tenant-scoped document store for catalog records.
///
/// Category upserts key on `(tenant_id, slug)`; dropship product upserts key
/// on `(tenant_id, provider, external_id)`. Each upsert is individually
/// atomic so a cancelled sync run never leaves a half-applied key.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn upsert_category(&self, category: Category) -> Result<UpsertOutcome, CatalogError>;

    async fn get_category(&self, tenant: &str, slug: &str)
        -> Result<Option<Category>, CatalogError>;

    async fn list_categories(&self, tenant: &str) -> Result<Vec<Category>, CatalogError>;

    async fn set_product_count(
        &self,
        tenant: &str,
        slug: &str,
        count: i64,
    ) -> Result<(), CatalogError>;

    async fn upsert_dropship_product(
        &self,
        product: Product,
    ) -> Result<UpsertOutcome, CatalogError>;

    async fn get_product(&self, tenant: &str, id: Uuid) -> Result<Option<Product>, CatalogError>;

    async fn find_dropship_product(
        &self,
        tenant: &str,
        provider: &str,
        external_id: &str,
    ) -> Result<Option<Product>, CatalogError>;

    async fn list_dropship_products(
        &self,
        tenant: &str,
        provider: &str,
    ) -> Result<Vec<Product>, CatalogError>;

    async fn list_products(&self, tenant: &str) -> Result<Vec<Product>, CatalogError>;

    async fn count_active_products(
        &self,
        tenant: &str,
        category_slug: &str,
    ) -> Result<i64, CatalogError>;
}

#[derive(Default)]
struct TenantShard {
    categories: HashMap<String, Category>,
    products: HashMap<Uuid, Product>,
    /// (provider, external_id) → product id.
    by_source: HashMap<(String, String), Uuid>,
}

/// In-memory implementation. The default backend when no database is
/// configured, and the fixture for unit tests.
#[derive(Default)]
pub struct MemoryCatalog {
    shards: RwLock<HashMap<String, TenantShard>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn upsert_category(&self, category: Category) -> Result<UpsertOutcome, CatalogError> {
        let mut shards = self.shards.write().await;
        let shard = shards.entry(category.tenant_id.clone()).or_default();

        match shard.categories.get_mut(&category.slug) {
            Some(existing) => {
                // Identity and the denormalized count survive re-sync.
                existing.name = category.name;
                existing.parent_id = category.parent_id;
                existing.level = category.level;
                existing.path = category.path;
                existing.breadcrumbs = category.breadcrumbs;
                existing.is_active = category.is_active;
                existing.is_featured = category.is_featured;
                existing
                    .external_mappings
                    .extend(category.external_mappings);
                existing.updated_at = category.updated_at;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                shard.categories.insert(category.slug.clone(), category);
                Ok(UpsertOutcome::Created)
            }
        }
    }

    async fn get_category(
        &self,
        tenant: &str,
        slug: &str,
    ) -> Result<Option<Category>, CatalogError> {
        let shards = self.shards.read().await;
        Ok(shards
            .get(tenant)
            .and_then(|shard| shard.categories.get(slug).cloned()))
    }

    async fn list_categories(&self, tenant: &str) -> Result<Vec<Category>, CatalogError> {
        let shards = self.shards.read().await;
        let mut categories: Vec<Category> = shards
            .get(tenant)
            .map(|shard| shard.categories.values().cloned().collect())
            .unwrap_or_default();
        categories.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(categories)
    }

    async fn set_product_count(
        &self,
        tenant: &str,
        slug: &str,
        count: i64,
    ) -> Result<(), CatalogError> {
        let mut shards = self.shards.write().await;
        let category = shards
            .get_mut(tenant)
            .and_then(|shard| shard.categories.get_mut(slug))
            .ok_or_else(|| CatalogError::NotFound(format!("category {}/{}", tenant, slug)))?;
        category.product_count = count;
        category.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn upsert_dropship_product(
        &self,
        product: Product,
    ) -> Result<UpsertOutcome, CatalogError> {
        let (tenant, provider, external_id) = match product.source_key() {
            Some((tenant, provider, external_id)) => (
                tenant.to_string(),
                provider.to_string(),
                external_id.to_string(),
            ),
            None => {
                return Err(CatalogError::Storage(
                    "product is missing its dropship source key".to_string(),
                ))
            }
        };

        let mut shards = self.shards.write().await;
        let shard = shards.entry(tenant.clone()).or_default();
        let source = (provider.clone(), external_id.clone());

        match shard.by_source.get(&source) {
            Some(existing_id) => {
                let existing = match shard.products.get_mut(existing_id) {
                    Some(existing) => existing,
                    None => {
                        let key = format!("{}/{}/{}", tenant, provider, external_id);
                        tracing::error!(
                            "Idempotency index points at a missing product for {}",
                            key
                        );
                        return Err(CatalogError::IdempotencyConflict(key));
                    }
                };

                // Mutable fields refresh; identity (id, slug, sku, created_at)
                // and the source key stay fixed.
                existing.name = product.name;
                existing.description = product.description;
                existing.price = product.price;
                existing.list_price = product.list_price;
                existing.category_slug = product.category_slug;
                existing.images = product.images;
                existing.inventory = product.inventory;
                existing.is_active = product.is_active;
                existing.tags = product.tags;
                existing.variants = product.variants;
                existing.updated_at = product.updated_at;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                shard.by_source.insert(source, product.id);
                shard.products.insert(product.id, product);
                Ok(UpsertOutcome::Created)
            }
        }
    }

    async fn get_product(&self, tenant: &str, id: Uuid) -> Result<Option<Product>, CatalogError> {
        let shards = self.shards.read().await;
        Ok(shards
            .get(tenant)
            .and_then(|shard| shard.products.get(&id).cloned()))
    }

    async fn find_dropship_product(
        &self,
        tenant: &str,
        provider: &str,
        external_id: &str,
    ) -> Result<Option<Product>, CatalogError> {
        let shards = self.shards.read().await;
        Ok(shards.get(tenant).and_then(|shard| {
            shard
                .by_source
                .get(&(provider.to_string(), external_id.to_string()))
                .and_then(|id| shard.products.get(id).cloned())
        }))
    }

    async fn list_dropship_products(
        &self,
        tenant: &str,
        provider: &str,
    ) -> Result<Vec<Product>, CatalogError> {
        let shards = self.shards.read().await;
        let mut products: Vec<Product> = shards
            .get(tenant)
            .map(|shard| {
                shard
                    .products
                    .values()
                    .filter(|p| p.dropship_provider.as_deref() == Some(provider))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        products.sort_by(|a, b| a.sku.cmp(&b.sku));
        Ok(products)
    }

    async fn list_products(&self, tenant: &str) -> Result<Vec<Product>, CatalogError> {
        let shards = self.shards.read().await;
        let mut products: Vec<Product> = shards
            .get(tenant)
            .map(|shard| shard.products.values().cloned().collect())
            .unwrap_or_default();
        products.sort_by(|a, b| a.sku.cmp(&b.sku));
        Ok(products)
    }

    async fn count_active_products(
        &self,
        tenant: &str,
        category_slug: &str,
    ) -> Result<i64, CatalogError> {
        let shards = self.shards.read().await;
        Ok(shards
            .get(tenant)
            .map(|shard| {
                shard
                    .products
                    .values()
                    .filter(|p| p.is_active && p.category_slug == category_slug)
                    .count() as i64
            })
            .unwrap_or(0))
    }
}
