use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use vendra_catalog::defaults::{default_categories, DEFAULT_TAXONOMY_VERSION};
use vendra_catalog::{
    rebuild_hierarchy, CatalogError, CatalogStore, Category, Inventory, MarkupPolicy, Product,
    ProductVariant, SyncRunStore, UpsertOutcome,
};
use vendra_core::limiter::{RateLimiterPool, TokenBucket};
use vendra_core::provider::{HealthStatus, ProductQuery, Provider, ProviderCategory, ProviderProduct};
use vendra_core::ProviderRegistry;

use crate::cancel::CancelToken;
use crate::summary::{CategoryFailure, ImportSummary};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Invalid tenant id")]
    InvalidTenant,
}

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub markup: MarkupPolicy,
    pub page_size: u32,
    pub max_pages: u32,
    /// Worker pool width per run; the shared token bucket still caps the
    /// request rate across workers.
    pub max_concurrent: usize,
    /// How many categories to import products into when the caller does not
    /// select a subset.
    pub category_limit: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            markup: MarkupPolicy::default(),
            page_size: 40,
            max_pages: 5,
            max_concurrent: 3,
            category_limit: 10,
        }
    }
}

/// Per-run overrides supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Import products only into these category slugs.
    pub categories: Option<Vec<String>>,
    pub category_limit: Option<usize>,
}

/// Orchestrates category and product synchronization for a tenant.
///
/// Degrades gracefully: an unreachable or unconfigured provider yields the
/// versioned fallback taxonomy instead of an empty marketplace, and a
/// failing category never aborts the rest of the run.
pub struct CatalogImporter {
    registry: Arc<ProviderRegistry>,
    catalog: Arc<dyn CatalogStore>,
    sync_runs: Arc<dyn SyncRunStore>,
    limiter: Arc<RateLimiterPool>,
    config: ImportConfig,
}

impl CatalogImporter {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        catalog: Arc<dyn CatalogStore>,
        sync_runs: Arc<dyn SyncRunStore>,
        limiter: Arc<RateLimiterPool>,
        config: ImportConfig,
    ) -> Self {
        Self {
            registry,
            catalog,
            sync_runs,
            limiter,
            config,
        }
    }

    pub async fn sync_catalog(
        &self,
        tenant: &str,
        provider_name: &str,
        opts: &SyncOptions,
        cancel: &CancelToken,
    ) -> Result<ImportSummary, ImportError> {
        if tenant.trim().is_empty() {
            return Err(ImportError::InvalidTenant);
        }

        let mut summary = ImportSummary::new(tenant, provider_name);

        let provider = match self.registry.get(provider_name) {
            Ok(provider) => {
                let health = provider.check_health().await;
                if health.status == HealthStatus::Unreachable {
                    tracing::warn!(
                        "Provider {} unreachable ({:?}); skipping provider calls",
                        provider_name,
                        health.detail
                    );
                    None
                } else {
                    Some(provider)
                }
            }
            Err(err) => {
                tracing::warn!("Provider {} unavailable: {}", provider_name, err);
                None
            }
        };

        // Stored slugs keep their ids across re-syncs so parent links and
        // references stay stable.
        let existing_ids: HashMap<String, Uuid> = self
            .catalog
            .list_categories(tenant)
            .await
            .map(|categories| categories.into_iter().map(|c| (c.slug, c.id)).collect())
            .unwrap_or_default();

        let mut local_categories = match &provider {
            Some(provider) => match provider.get_categories().await {
                Ok(provider_categories) => {
                    map_provider_categories(tenant, provider_name, &provider_categories)
                }
                Err(err) => {
                    tracing::warn!(
                        "Category sync from {} failed: {}. Falling back to default taxonomy {}",
                        provider_name,
                        err,
                        DEFAULT_TAXONOMY_VERSION
                    );
                    summary.used_fallback = true;
                    default_categories(tenant)
                }
            },
            None => {
                summary.used_fallback = true;
                default_categories(tenant)
            }
        };
        adopt_existing_ids(&mut local_categories, &existing_ids);

        for category in &local_categories {
            if cancel.is_cancelled() {
                break;
            }
            match self.catalog.upsert_category(category.clone()).await {
                Ok(_) => summary.categories_synced += 1,
                Err(err) => summary.failed_categories.push(CategoryFailure {
                    slug: category.slug.clone(),
                    error: err.to_string(),
                }),
            }
        }

        if let Some(provider) = provider {
            let limit = opts.category_limit.unwrap_or(self.config.category_limit);
            let targets: Vec<Category> = match &opts.categories {
                Some(slugs) => local_categories
                    .iter()
                    .filter(|c| slugs.contains(&c.slug))
                    .cloned()
                    .collect(),
                None => local_categories.iter().take(limit).cloned().collect(),
            };

            let bucket = self.limiter.bucket(tenant, provider_name).await;
            let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));
            let mut workers = JoinSet::new();

            for category in targets {
                if cancel.is_cancelled() {
                    break;
                }
                workers.spawn(import_category(
                    self.catalog.clone(),
                    provider.clone(),
                    bucket.clone(),
                    semaphore.clone(),
                    cancel.clone(),
                    tenant.to_string(),
                    provider_name.to_string(),
                    category,
                    self.config.markup.clone(),
                    self.config.page_size,
                    self.config.max_pages,
                ));
            }

            while let Some(joined) = workers.join_next().await {
                match joined {
                    Ok(outcome) => {
                        summary.products_imported += outcome.imported;
                        summary.products_updated += outcome.updated;
                        summary.products_skipped += outcome.skipped;
                        if let Some(error) = outcome.error {
                            summary.failed_categories.push(CategoryFailure {
                                slug: outcome.slug,
                                error,
                            });
                        }
                    }
                    Err(join_err) => {
                        tracing::error!("Import worker panicked: {}", join_err);
                    }
                }
            }
        }

        if !cancel.is_cancelled() {
            if let Err(err) = self
                .sync_runs
                .record_category_sync(tenant, provider_name, Utc::now())
                .await
            {
                tracing::warn!("Failed to record sync run: {}", err);
            }
        }

        summary.finished_at = Some(Utc::now());
        Ok(summary)
    }
}

struct CategoryOutcome {
    slug: String,
    imported: u64,
    updated: u64,
    skipped: u64,
    error: Option<String>,
}

#[allow(clippy::too_many_arguments)]
async fn import_category(
    catalog: Arc<dyn CatalogStore>,
    provider: Arc<dyn Provider>,
    bucket: Arc<TokenBucket>,
    semaphore: Arc<Semaphore>,
    cancel: CancelToken,
    tenant: String,
    provider_name: String,
    category: Category,
    markup: MarkupPolicy,
    page_size: u32,
    max_pages: u32,
) -> CategoryOutcome {
    let mut outcome = CategoryOutcome {
        slug: category.slug.clone(),
        imported: 0,
        updated: 0,
        skipped: 0,
        error: None,
    };

    let _permit = match semaphore.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return outcome,
    };

    // Provider-mapped categories page by category id; fallback categories
    // have no mapping and search by name instead.
    let category_ref = category.external_mappings.get(&provider_name).cloned();

    'pages: for page in 1..=max_pages {
        if cancel.is_cancelled() {
            break;
        }
        bucket.acquire().await;

        let query = match &category_ref {
            Some(id) => ProductQuery::by_category(id.clone(), page, page_size),
            None => ProductQuery::by_keyword(category.name.clone(), page, page_size),
        };

        let batch = match provider.fetch_products(&query).await {
            Ok(batch) => batch,
            Err(err) => {
                outcome.error = Some(err.to_string());
                break;
            }
        };
        let batch_len = batch.len();

        for item in batch {
            match to_product(
                &tenant,
                &provider_name,
                provider.sku_prefix(),
                &category.slug,
                item,
                &markup,
            ) {
                Ok(product) => match catalog.upsert_dropship_product(product).await {
                    Ok(UpsertOutcome::Created) => outcome.imported += 1,
                    Ok(UpsertOutcome::Updated) => outcome.updated += 1,
                    Err(err @ CatalogError::IdempotencyConflict(_)) => {
                        tracing::error!("Aborting category {}: {}", category.slug, err);
                        outcome.error = Some(err.to_string());
                        break 'pages;
                    }
                    Err(err) => {
                        tracing::warn!("Skipping product in {}: {}", category.slug, err);
                        outcome.skipped += 1;
                    }
                },
                Err(reason) => {
                    tracing::warn!("Skipping malformed product in {}: {}", category.slug, reason);
                    outcome.skipped += 1;
                }
            }
        }

        if batch_len < page_size as usize {
            break;
        }
    }

    // Read-count-then-write keeps the denormalized count honest even when
    // sibling categories import concurrently.
    match catalog.count_active_products(&tenant, &category.slug).await {
        Ok(count) => {
            if let Err(err) = catalog.set_product_count(&tenant, &category.slug, count).await {
                tracing::warn!("Failed to store product count for {}: {}", category.slug, err);
            }
        }
        Err(err) => {
            tracing::warn!("Failed to count products for {}: {}", category.slug, err);
        }
    }

    outcome
}

/// Transform a provider record into a tenant product. Pricing always goes
/// through the markup policy; supplier prices never land unmodified.
fn to_product(
    tenant: &str,
    provider_name: &str,
    sku_prefix: &str,
    category_slug: &str,
    item: ProviderProduct,
    markup: &MarkupPolicy,
) -> Result<Product, String> {
    if item.id.trim().is_empty() {
        return Err("empty product id".to_string());
    }

    let sku = format!("{}-{}", sku_prefix, item.id);
    let mut product = Product::new_dropship(
        tenant,
        item.name.clone(),
        category_slug,
        provider_name,
        item.id.clone(),
        sku,
    );

    let retail = markup.retail(item.price);
    product.price = retail;
    product.list_price = retail;
    product.description = item.description;
    product.images = item.image_url.into_iter().collect();
    product.inventory = Inventory::new(item.stock, 5);
    product.tags = vec!["dropship".to_string(), provider_name.to_string()];
    product.variants = item
        .variants
        .into_iter()
        .map(|v| ProductVariant {
            name: v.name,
            value: v.value,
            price: v.price.map(|p| markup.retail(p)),
        })
        .collect();

    Ok(product)
}

/// Build local categories from the provider tree: external mapping recorded,
/// provider parent links resolved to local ids, hierarchy recomputed.
fn map_provider_categories(
    tenant: &str,
    provider_name: &str,
    provider_categories: &[ProviderCategory],
) -> Vec<Category> {
    let mut locals: Vec<Category> = provider_categories
        .iter()
        .map(|pc| {
            let mut category = Category::new(tenant, pc.name.clone());
            if !pc.slug.is_empty() && category.slug != pc.slug {
                category.slug = pc.slug.clone();
                category.path = pc.slug.clone();
            }
            category
                .external_mappings
                .insert(provider_name.to_string(), pc.id.clone());
            category
        })
        .collect();

    let index_by_provider_id: HashMap<&str, usize> = provider_categories
        .iter()
        .enumerate()
        .map(|(i, pc)| (pc.id.as_str(), i))
        .collect();
    let local_ids: Vec<Uuid> = locals.iter().map(|c| c.id).collect();

    for (i, pc) in provider_categories.iter().enumerate() {
        if let Some(parent) = &pc.parent_id {
            if let Some(&parent_index) = index_by_provider_id.get(parent.as_str()) {
                locals[i].parent_id = Some(local_ids[parent_index]);
            }
        }
    }

    rebuild_hierarchy(&mut locals);
    locals
}

/// Re-point freshly built categories at the ids already stored for their
/// slugs, so re-syncs update in place and parent links stay consistent.
fn adopt_existing_ids(categories: &mut [Category], existing: &HashMap<String, Uuid>) {
    let mut remap: HashMap<Uuid, Uuid> = HashMap::new();
    for category in categories.iter_mut() {
        if let Some(&stored) = existing.get(&category.slug) {
            remap.insert(category.id, stored);
            category.id = stored;
        }
    }
    for category in categories.iter_mut() {
        if let Some(parent_id) = category.parent_id {
            if let Some(&mapped) = remap.get(&parent_id) {
                category.parent_id = Some(mapped);
            }
        }
    }
}
