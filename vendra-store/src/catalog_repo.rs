use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use vendra_catalog::{CatalogError, CatalogStore, Category, Product, UpsertOutcome};

/// Postgres-backed catalog store: one JSONB document per record, keyed by
/// the same idempotency keys the domain defines. `ON CONFLICT` makes every
/// upsert a single atomic statement.
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage(err: sqlx::Error) -> CatalogError {
    CatalogError::Storage(err.to_string())
}

fn encode<T: serde::Serialize>(record: &T) -> Result<Value, CatalogError> {
    serde_json::to_value(record).map_err(|e| CatalogError::Storage(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(doc: Value) -> Result<T, CatalogError> {
    serde_json::from_value(doc).map_err(|e| CatalogError::Storage(e.to_string()))
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn upsert_category(&self, category: Category) -> Result<UpsertOutcome, CatalogError> {
        let doc = encode(&category)?;

        // On update the stored identity, denormalized count and creation
        // time survive, and external mappings from other providers merge in.
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO catalog_categories (tenant_id, slug, doc)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id, slug) DO UPDATE
            SET doc = EXCLUDED.doc || jsonb_build_object(
                'id', catalog_categories.doc->'id',
                'product_count', catalog_categories.doc->'product_count',
                'created_at', catalog_categories.doc->'created_at',
                'external_mappings',
                    (catalog_categories.doc->'external_mappings') || (EXCLUDED.doc->'external_mappings'))
            RETURNING (xmax = 0)
            "#,
        )
        .bind(&category.tenant_id)
        .bind(&category.slug)
        .bind(&doc)
        .fetch_one(&self.pool)
        .await
        .map_err(storage)?;

        Ok(if inserted {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        })
    }

    async fn get_category(
        &self,
        tenant: &str,
        slug: &str,
    ) -> Result<Option<Category>, CatalogError> {
        let doc: Option<Value> = sqlx::query_scalar(
            "SELECT doc FROM catalog_categories WHERE tenant_id = $1 AND slug = $2",
        )
        .bind(tenant)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        doc.map(decode).transpose()
    }

    async fn list_categories(&self, tenant: &str) -> Result<Vec<Category>, CatalogError> {
        let docs: Vec<Value> = sqlx::query_scalar(
            "SELECT doc FROM catalog_categories WHERE tenant_id = $1 ORDER BY doc->>'path'",
        )
        .bind(tenant)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        docs.into_iter().map(decode).collect()
    }

    async fn set_product_count(
        &self,
        tenant: &str,
        slug: &str,
        count: i64,
    ) -> Result<(), CatalogError> {
        let result = sqlx::query(
            r#"
            UPDATE catalog_categories
            SET doc = jsonb_set(doc, '{product_count}', to_jsonb($3::BIGINT))
            WHERE tenant_id = $1 AND slug = $2
            "#,
        )
        .bind(tenant)
        .bind(slug)
        .bind(count)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(format!(
                "category {}/{}",
                tenant, slug
            )));
        }
        Ok(())
    }

    async fn upsert_dropship_product(
        &self,
        product: Product,
    ) -> Result<UpsertOutcome, CatalogError> {
        let (tenant, provider, external_id) = product
            .source_key()
            .map(|(t, p, e)| (t.to_string(), p.to_string(), e.to_string()))
            .ok_or_else(|| {
                CatalogError::Storage("product is missing its dropship source key".to_string())
            })?;
        let doc = encode(&product)?;

        // The primary key IS the idempotency key, so duplicates cannot
        // exist; identity fields survive the update.
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO catalog_products (tenant_id, provider, external_id, id, doc)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tenant_id, provider, external_id) DO UPDATE
            SET doc = EXCLUDED.doc || jsonb_build_object(
                'id', catalog_products.doc->'id',
                'slug', catalog_products.doc->'slug',
                'sku', catalog_products.doc->'sku',
                'created_at', catalog_products.doc->'created_at')
            RETURNING (xmax = 0)
            "#,
        )
        .bind(&tenant)
        .bind(&provider)
        .bind(&external_id)
        .bind(product.id)
        .bind(&doc)
        .fetch_one(&self.pool)
        .await
        .map_err(storage)?;

        Ok(if inserted {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        })
    }

    async fn get_product(&self, tenant: &str, id: Uuid) -> Result<Option<Product>, CatalogError> {
        let doc: Option<Value> = sqlx::query_scalar(
            "SELECT doc FROM catalog_products WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        doc.map(decode).transpose()
    }

    async fn find_dropship_product(
        &self,
        tenant: &str,
        provider: &str,
        external_id: &str,
    ) -> Result<Option<Product>, CatalogError> {
        let doc: Option<Value> = sqlx::query_scalar(
            r#"
            SELECT doc FROM catalog_products
            WHERE tenant_id = $1 AND provider = $2 AND external_id = $3
            "#,
        )
        .bind(tenant)
        .bind(provider)
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        doc.map(decode).transpose()
    }

    async fn list_dropship_products(
        &self,
        tenant: &str,
        provider: &str,
    ) -> Result<Vec<Product>, CatalogError> {
        let docs: Vec<Value> = sqlx::query_scalar(
            r#"
            SELECT doc FROM catalog_products
            WHERE tenant_id = $1 AND provider = $2
            ORDER BY doc->>'sku'
            "#,
        )
        .bind(tenant)
        .bind(provider)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        docs.into_iter().map(decode).collect()
    }

    async fn list_products(&self, tenant: &str) -> Result<Vec<Product>, CatalogError> {
        let docs: Vec<Value> = sqlx::query_scalar(
            "SELECT doc FROM catalog_products WHERE tenant_id = $1 ORDER BY doc->>'sku'",
        )
        .bind(tenant)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        docs.into_iter().map(decode).collect()
    }

    async fn count_active_products(
        &self,
        tenant: &str,
        category_slug: &str,
    ) -> Result<i64, CatalogError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM catalog_products
            WHERE tenant_id = $1
              AND doc->>'category_slug' = $2
              AND (doc->>'is_active')::BOOLEAN
            "#,
        )
        .bind(tenant)
        .bind(category_slug)
        .fetch_one(&self.pool)
        .await
        .map_err(storage)?;

        Ok(count)
    }
}
